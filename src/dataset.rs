// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 数据集划分与遍历
//!
//! 按标签CSV (`img_name`, `class`, `subset` 列) 把原始图片硬链接到:
//!
//! ```text
//! car_ims_v1/
//! ├── test
//! │   ├── AM General Hummer SUV 2000
//! │   │   ├── 000046.jpg
//! ├── train
//! │   ├── AM General Hummer SUV 2000
//! │   │   ├── 000001.jpg
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// 标签CSV中的一行 (其余列忽略)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelRecord {
    pub img_name: String,
    pub class: String,
    pub subset: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// 新建的硬链接数
    pub linked: usize,
    /// 目标已存在而跳过的数量
    pub skipped: usize,
    /// subset × class 目录数
    pub folders: usize,
}

pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<LabelRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open labels {}", path.display()))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        let record: LabelRecord =
            record.with_context(|| format!("malformed row in {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// 按CSV划分 train/test, 重复运行时跳过已存在的文件
pub fn split_dataset<P, Q, R>(data_folder: P, labels: Q, output_data_folder: R) -> Result<SplitSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let (data_folder, output) = (data_folder.as_ref(), output_data_folder.as_ref());
    let records = read_labels(labels)?;

    let subsets = unique(records.iter().map(|r| r.subset.as_str()));
    let classes = unique(records.iter().map(|r| r.class.as_str()));

    let mut summary = SplitSummary::default();
    for subset in &subsets {
        for class in &classes {
            let dir = output.join(subset).join(class);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            summary.folders += 1;
        }
    }

    for record in &records {
        let target = output
            .join(&record.subset)
            .join(&record.class)
            .join(&record.img_name);
        if target.exists() {
            summary.skipped += 1;
            continue;
        }
        let source = data_folder.join(&record.img_name);
        fs::hard_link(&source, &target).with_context(|| {
            format!("failed to link {} -> {}", source.display(), target.display())
        })?;
        debug!("🔗 {} -> {}", source.display(), target.display());
        summary.linked += 1;
    }

    info!(
        "✅ 数据集划分完成: {} 个目录, 新链接 {}, 跳过 {}",
        summary.folders, summary.linked, summary.skipped
    );
    Ok(summary)
}

/// 递归列出目录下所有可识别格式的图片 (按路径排序)
pub fn walk_images<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(folder.as_ref()).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && image::ImageFormat::from_path(entry.path()).is_ok() {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// 真实标签 = 所在目录名
pub fn label_of(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
