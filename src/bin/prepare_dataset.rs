// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 数据集划分工具
//!
//! 按标签CSV把原始图片硬链接到 `<output>/<subset>/<class>/` 目录结构中,
//! 已存在的文件会被跳过, 可以重复运行。

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use car_classifier_rs::dataset::split_dataset;

#[derive(Parser, Debug)]
#[command(author, version, about = "按标签CSV划分 train/test 数据集", long_about = None)]
struct Args {
    /// 原始图片目录
    data_folder: PathBuf,

    /// 标签CSV (img_name, class, subset)
    labels: PathBuf,

    /// 输出目录, 不存在时自动创建
    output_data_folder: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("📂 原始图片: {}", args.data_folder.display());
    info!("🏷️ 标签文件: {}", args.labels.display());
    info!("📁 输出目录: {}", args.output_data_folder.display());

    split_dataset(&args.data_folder, &args.labels, &args.output_data_folder)?;
    Ok(())
}
