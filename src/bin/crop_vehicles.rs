// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 车辆裁剪工具
//!
//! 对数据集中每张图片运行目标检测, 选出面积最大的车辆框并裁剪保存,
//! 输出目录结构与输入一致。没有检测到车辆时保存整张图片。

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use car_classifier_rs::crop::crop_dataset;
use car_classifier_rs::detection::{DetectorConfig, VehicleDetector};
use car_classifier_rs::models::Model;
use car_classifier_rs::Device;

#[derive(Parser, Debug)]
#[command(author, version, about = "检测并裁剪数据集中的车辆", long_about = None)]
struct Args {
    /// 检测模型 (YOLOv8 ONNX)
    #[arg(short, long, default_value = "models/yolov8m.onnx")]
    model: String,

    /// 输入数据集目录
    #[arg(short, long)]
    input: PathBuf,

    /// 输出目录
    #[arg(short, long)]
    output: PathBuf,

    /// 推理设备
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    device: Device,

    #[arg(long, default_value_t = 0)]
    device_id: i32,

    /// 加速器不可用时直接报错, 不回退 CPU
    #[arg(long, default_value_t = false)]
    no_cpu_fallback: bool,

    /// 置信度阈值
    #[arg(long, default_value_t = 0.5)]
    conf: f32,

    /// NMS IOU阈值
    #[arg(long, default_value_t = 0.45)]
    iou: f32,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 640)]
    height: u32,

    /// 视为车辆的类别
    #[arg(long, value_delimiter = ',', default_value = "car,truck")]
    classes: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("🚀 车辆裁剪启动");
    info!("📦 检测模型: {}", args.model);
    info!("📂 输入: {} → 📁 输出: {}", args.input.display(), args.output.display());

    let mut detector = VehicleDetector::new(DetectorConfig {
        model: args.model,
        device: args.device,
        device_id: args.device_id,
        cpu_fallback: !args.no_cpu_fallback,
        width: args.width,
        height: args.height,
        conf: args.conf,
        iou: args.iou,
        accepted_classes: args.classes,
    })?;
    detector.summary();

    crop_dataset(&mut detector, &args.input, &args.output)?;
    Ok(())
}
