// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 模型统一接口与实现
//!
//! # 架构说明
//!
//! - **ResNet50**: 车型分类器 (微调后导出的 ONNX), 文件: `resnet50.rs`
//! - **VehicleDetector**: COCO 车辆检测器, 文件: `detection/detector.rs`
//!
//! ## Model Trait
//! 统一的模型接口，定义标准流程: preprocess → run → postprocess
//!
//! ## 使用示例
//! ```no_run
//! use car_classifier_rs::models::{ClassifierConfig, Model, ResNet50};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut model = ResNet50::new(ClassifierConfig::new("experiments/exp_001/model.onnx"))?;
//! let img = image::open("car.jpg")?;
//! let probs = model.forward(&[img])?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use image::DynamicImage;
use ndarray::{Array, IxDyn};

pub mod resnet50;

pub use resnet50::{
    classifier_input, ClassifierConfig, Layout, Preprocess, ResNet50, IMAGENET_BGR_MEAN,
};

/// 统一的深度学习模型接口
///
/// ## 核心流程
/// ```text
/// 原始图片 → preprocess → ndarray张量
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 → postprocess → 结果
/// ```
pub trait Model {
    /// 每张图的结果类型
    type Output;

    /// 预处理: 图片 → 批量输入张量
    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Array<f32, IxDyn>>;

    /// 推理: 执行模型前向传播, 返回原始输出
    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Vec<Array<f32, IxDyn>>>;

    /// 后处理: 原始输出 → 每张图一个结果
    ///
    /// * `xs0` - 原始图片(用于坐标还原)
    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<Self::Output>>;

    /// 完整的推理流程: preprocess → run → postprocess
    fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<Self::Output>> {
        let xs = self.preprocess(images)?;
        let ys = self.run(xs)?;
        self.postprocess(ys, images)
    }

    /// 打印模型信息
    fn summary(&self);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embedding {
    // An float32 n-dims tensor
    data: Array<f32, IxDyn>,
}

impl Embedding {
    pub fn new(data: Array<f32, IxDyn>) -> Self {
        Self { data }
    }

    pub fn topk(&self, k: usize) -> Vec<(usize, f32)> {
        let mut probs = self
            .data
            .iter()
            .enumerate()
            .map(|(a, b)| (a, *b))
            .collect::<Vec<_>>();
        probs.sort_by(|a, b| b.1.total_cmp(&a.1));
        probs.truncate(k);
        probs
    }

    pub fn top1(&self) -> Option<(usize, f32)> {
        self.topk(1).into_iter().next()
    }
}
