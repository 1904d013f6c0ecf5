// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 模型评估工具
//!
//! 用实验配置中的分类模型预测测试目录下全部图片, 输出准确率并保存JSON报告。

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use car_classifier_rs::config::{class_names, load_config};
use car_classifier_rs::evaluation::{predict_from_folder, EvaluationReport};
use car_classifier_rs::models::{ClassifierConfig, Model, ResNet50};
use car_classifier_rs::{gen_time_string, Device};

#[derive(Parser, Debug)]
#[command(author, version, about = "评估车型分类模型", long_about = None)]
struct Args {
    /// 实验配置文件 (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// 模型权重 (ONNX), 缺省时使用配置中的 model.weights
    #[arg(short, long)]
    weights: Option<String>,

    /// 测试集目录
    #[arg(short, long)]
    folder: PathBuf,

    /// 推理设备
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    device: Device,

    #[arg(long, default_value_t = 0)]
    device_id: i32,

    /// 报告保存路径, 缺省为 report_<时间>.json
    #[arg(short, long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let classes = class_names(&config)?;
    info!("🏷️ 类别数: {}", classes.len());

    let mut classifier_config = ClassifierConfig::from_experiment(&config);
    if let Some(weights) = args.weights {
        classifier_config.weights = weights;
    }
    classifier_config.device = args.device;
    classifier_config.device_id = args.device_id;
    if classifier_config.classes.is_none() {
        classifier_config.classes = Some(classes.len());
    }
    let weights = classifier_config.weights.clone();

    let mut model = ResNet50::new(classifier_config)?;
    model.summary();

    let (predictions, labels) = predict_from_folder(&args.folder, &mut model, &classes)?;
    let report = EvaluationReport::new(&weights, &args.folder, &predictions, &labels);
    report.print_summary();

    let path = args
        .report
        .unwrap_or_else(|| PathBuf::from(format!("report_{}.json", gen_time_string("-"))));
    report.save(path)?;
    Ok(())
}
