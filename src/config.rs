// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 实验配置 - 通过YAML文件描述一次实验
//!
//! ```yaml
//! seed: 123
//! data:
//!   directory: /home/app/src/data/car_ims_v2/train
//!   image_size: [224, 224]
//! model:
//!   weights: experiments/exp_008/model.onnx
//!   input_shape: [224, 224, 3]
//!   classes: 196
//!   data_aug_layer:
//!     random_flip:
//!       mode: horizontal
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::augment::AugmentationConfig;
use crate::models::{Layout, Preprocess};

/// 配置加载/校验错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Missing experiment seed")]
    MissingSeed,
    #[error("Missing experiment data")]
    MissingData,
    #[error("Missing experiment training data")]
    MissingDataDirectory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    /// 训练集根目录, 每个子目录是一个类别
    pub directory: PathBuf,
    /// (height, width), 预测时的缩放尺寸
    #[serde(default)]
    pub image_size: Option<[u32; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `imagenet` 或微调后导出的 ONNX 模型路径
    pub weights: String,
    /// (height, width, channels)
    pub input_shape: [u32; 3],
    pub classes: Option<usize>,
    pub layout: Layout,
    /// 图外预处理, 默认 raw (预处理已导出在模型内)
    pub preprocess: Preprocess,
    pub data_aug_layer: Option<AugmentationConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: "imagenet".to_string(),
            input_shape: [224, 224, 3],
            classes: None,
            layout: Layout::Nhwc,
            preprocess: Preprocess::Raw,
            data_aug_layer: None,
        }
    }
}

/// 最低要求检查: seed / data / data.directory
pub fn validate_config(value: &serde_yaml::Value) -> Result<(), ConfigError> {
    if value.get("seed").is_none() {
        return Err(ConfigError::MissingSeed);
    }
    let data = value.get("data").ok_or(ConfigError::MissingData)?;
    if data.get("directory").is_none() {
        return Err(ConfigError::MissingDataDirectory);
    }
    Ok(())
}

pub fn parse_config(text: &str) -> Result<ExperimentConfig, ConfigError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    validate_config(&value)?;
    Ok(serde_yaml::from_value(value)?)
}

/// 从YAML文件加载配置
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExperimentConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// 类别名称 (训练目录下子目录名, 排序后即模型输出的类别顺序)
pub fn class_names(config: &ExperimentConfig) -> Result<Vec<String>> {
    let dir = &config.data.directory;
    let mut names = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
