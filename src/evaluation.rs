// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 批量预测与评估
//!
//! 目录结构与训练集相同: 每张图片放在以类别命名的目录中,
//! 目录名即真实标签。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dataset::{label_of, walk_images};
use crate::gen_time_string;
use crate::models::{Embedding, Model};

/// 遍历目录下所有图片, 返回 (预测类别, 真实类别), 顺序一致
pub fn predict_from_folder<M, P>(
    folder: P,
    model: &mut M,
    class_names: &[String],
) -> Result<(Vec<String>, Vec<String>)>
where
    M: Model<Output = Embedding> + ?Sized,
    P: AsRef<Path>,
{
    let mut predictions = Vec::new();
    let mut labels = Vec::new();

    for path in walk_images(folder)? {
        let img = image::open(&path)
            .with_context(|| format!("failed to load image {}", path.display()))?;
        let probs = model
            .forward(std::slice::from_ref(&img))?
            .into_iter()
            .next()
            .context("model returned no predictions")?;
        let (id, confidence) = probs.top1().context("model returned an empty score vector")?;
        let name = class_names.get(id).with_context(|| {
            format!(
                "predicted class index {} but only {} class names are known",
                id,
                class_names.len()
            )
        })?;
        debug!("🔍 {} → {} ({:.3})", path.display(), name, confidence);

        predictions.push(name.clone());
        labels.push(label_of(&path).unwrap_or_default());
    }

    Ok((predictions, labels))
}

pub fn accuracy(predictions: &[String], labels: &[String]) -> f32 {
    if predictions.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f32 / predictions.len() as f32
}

/// 评估报告 (JSON)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: String,
    pub folder: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f32,
    pub created_at: String,
}

impl EvaluationReport {
    pub fn new(model: &str, folder: &Path, predictions: &[String], labels: &[String]) -> Self {
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        Self {
            model: model.to_string(),
            folder: folder.display().to_string(),
            total: predictions.len(),
            correct,
            accuracy: accuracy(predictions, labels),
            created_at: gen_time_string("-"),
        }
    }

    /// 保存报告到JSON文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("💾 评估报告已保存到 {}", path.display());
        Ok(())
    }

    pub fn print_summary(&self) {
        info!(
            "📊 {} | 样本: {} | 正确: {} | 准确率: {:.4}",
            self.folder, self.total, self.correct, self.accuracy
        );
    }
}
