// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 数据增强预览
//!
//! 读取实验配置中的 `data_aug_layer`, 对一张图片生成若干增强样本。
//! 随机数种子取自配置的 `seed`, 同一配置的输出可复现。

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use car_classifier_rs::augment::Augmenter;
use car_classifier_rs::config::load_config;

#[derive(Parser, Debug)]
#[command(author, version, about = "预览数据增强效果", long_about = None)]
struct Args {
    /// 实验配置文件 (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// 输入图片
    #[arg(short, long)]
    image: PathBuf,

    /// 输出目录
    #[arg(short, long, default_value = "augment_preview")]
    out: PathBuf,

    /// 生成数量
    #[arg(short = 'n', long, default_value_t = 4)]
    count: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let Some(aug_config) = config.model.data_aug_layer.as_ref() else {
        bail!("{} has no model.data_aug_layer section", args.config.display());
    };
    let augmenter = Augmenter::from_config(aug_config);
    info!("🎲 增强层: {:?}", augmenter.layers());

    let img = image::open(&args.image)
        .with_context(|| format!("failed to load image {}", args.image.display()))?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let stem = args
        .image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mut rng = StdRng::seed_from_u64(config.seed);
    for i in 0..args.count {
        let path = args.out.join(format!("{}_aug{}.png", stem, i));
        augmenter
            .apply(&img, &mut rng)
            .save(&path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        info!("💾 {}", path.display());
    }
    Ok(())
}
