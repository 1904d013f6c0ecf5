// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ResNet-50 车型分类器
// 输入: 微调后从 Keras 导出的 ONNX 模型 (softmax 输出)
// 导出的图内已包含 resnet50.preprocess_input, 默认直接输入 RGB 原始像素

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use log::info;
use ndarray::{Array, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use super::{Embedding, Model};
use crate::config::ExperimentConfig;
use crate::{Device, OrtBackend, OrtConfig};

/// ImageNet 均值 (BGR 顺序), caffe 风格预处理
pub const IMAGENET_BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// 模型外部的输入预处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preprocess {
    /// RGB 原始像素 [0, 255]
    #[default]
    Raw,
    /// RGB 转 BGR 后减 ImageNet 均值, 用于图内不含预处理的模型
    Caffe,
}

/// 输入张量布局: Keras 导出默认 NHWC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// ONNX 模型路径
    pub weights: String,
    pub device: Device,
    pub device_id: i32,
    pub cpu_fallback: bool,
    pub height: u32,
    pub width: u32,
    pub layout: Layout,
    pub preprocess: Preprocess,
    /// 类别数, 为空时不校验输出维度
    pub classes: Option<usize>,
}

impl ClassifierConfig {
    pub fn new(weights: impl Into<String>) -> Self {
        Self {
            weights: weights.into(),
            device: Device::Cpu,
            device_id: 0,
            cpu_fallback: true,
            height: 224,
            width: 224,
            layout: Layout::Nhwc,
            preprocess: Preprocess::Raw,
            classes: None,
        }
    }

    /// 从实验配置构造; 输入尺寸优先取 `data.image_size`, 其次 `model.input_shape`
    pub fn from_experiment(config: &ExperimentConfig) -> Self {
        let model = &config.model;
        let [height, width] = match config.data.image_size {
            Some(size) => size,
            None => [model.input_shape[0], model.input_shape[1]],
        };
        Self {
            height,
            width,
            layout: model.layout,
            preprocess: model.preprocess,
            classes: model.classes,
            ..Self::new(model.weights.clone())
        }
    }
}

/// 最近邻缩放到模型输入尺寸, 按 `preprocess` 转换像素 (不缩放到 [0, 1])
pub fn classifier_input(
    images: &[DynamicImage],
    height: u32,
    width: u32,
    layout: Layout,
    preprocess: Preprocess,
) -> Array<f32, IxDyn> {
    let (h, w, n) = (height as usize, width as usize, images.len());
    let mut ys = match layout {
        Layout::Nhwc => Array::<f32, _>::zeros((n, h, w, 3)).into_dyn(),
        Layout::Nchw => Array::<f32, _>::zeros((n, 3, h, w)).into_dyn(),
    };

    for (idx, x) in images.iter().enumerate() {
        let img = x.resize_exact(width, height, FilterType::Nearest).to_rgb8();
        for (x, y, rgb) in img.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            let [r, g, b] = rgb.0;
            let values = match preprocess {
                Preprocess::Raw => [r as f32, g as f32, b as f32],
                Preprocess::Caffe => [
                    b as f32 - IMAGENET_BGR_MEAN[0],
                    g as f32 - IMAGENET_BGR_MEAN[1],
                    r as f32 - IMAGENET_BGR_MEAN[2],
                ],
            };
            for (c, &v) in values.iter().enumerate() {
                match layout {
                    Layout::Nhwc => ys[[idx, y, x, c]] = v,
                    Layout::Nchw => ys[[idx, c, y, x]] = v,
                }
            }
        }
    }

    ys
}

/// ResNet-50 分类模型
pub struct ResNet50 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    layout: Layout,
    preprocess: Preprocess,
    classes: Option<usize>,
}

impl ResNet50 {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        if config.weights == "imagenet" {
            bail!("`imagenet` weights are for finetuning, a finetuned ONNX model path is required for predictions");
        }
        let engine = OrtBackend::build(OrtConfig {
            ep: config.device.ep(config.device_id),
            f: config.weights,
            cpu_fallback: config.cpu_fallback,
        })?;

        Ok(Self {
            engine,
            height: config.height,
            width: config.width,
            layout: config.layout,
            preprocess: config.preprocess,
            classes: config.classes,
        })
    }
}

impl Model for ResNet50 {
    type Output = Embedding;

    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        Ok(classifier_input(
            images,
            self.height,
            self.width,
            self.layout,
            self.preprocess,
        ))
    }

    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Vec<Array<f32, IxDyn>>> {
        self.engine.run(xs)
    }

    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        _xs0: &[DynamicImage],
    ) -> Result<Vec<Self::Output>> {
        let preds = xs.first().context("classifier produced no outputs")?;
        if preds.ndim() != 2 {
            bail!(
                "unexpected classifier output shape {:?}, expected [batch, classes]",
                preds.shape()
            );
        }
        if let Some(nc) = self.classes {
            if preds.shape()[1] != nc {
                bail!(
                    "classifier outputs {} scores but the experiment has {} classes",
                    preds.shape()[1],
                    nc
                );
            }
        }

        Ok(preds
            .axis_iter(Axis(0))
            .map(|row| Embedding::new(row.to_owned()))
            .collect())
    }

    fn summary(&self) {
        info!(
            "🧠 ResNet50 分类器: {} | 设备: {} | 输入: {}x{} ({:?}, {:?}) | 类别: {}",
            self.engine.model_path(),
            self.engine.ep(),
            self.width,
            self.height,
            self.layout,
            self.preprocess,
            self.classes
                .map(|nc| nc.to_string())
                .unwrap_or_else(|| "auto".to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
    }

    #[test]
    fn test_raw_input_keeps_rgb_pixels() {
        let ys = classifier_input(
            &[solid(2, 2, [255, 0, 0])],
            2,
            2,
            Layout::Nhwc,
            Preprocess::default(),
        );
        assert_eq!(ys.shape(), &[1, 2, 2, 3]);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(
                    [ys[[0, y, x, 0]], ys[[0, y, x, 1]], ys[[0, y, x, 2]]],
                    [255.0, 0.0, 0.0]
                );
            }
        }
    }

    #[test]
    fn test_raw_input_nchw() {
        let ys = classifier_input(
            &[solid(3, 3, [10, 20, 30])],
            2,
            2,
            Layout::Nchw,
            Preprocess::Raw,
        );
        assert_eq!(ys.shape(), &[1, 3, 2, 2]);
        assert_eq!(ys[[0, 0, 1, 1]], 10.0);
        assert_eq!(ys[[0, 2, 0, 1]], 30.0);
    }

    #[test]
    fn test_caffe_preprocess_nhwc() {
        let ys = classifier_input(
            &[solid(10, 6, [255, 0, 0])],
            4,
            4,
            Layout::Nhwc,
            Preprocess::Caffe,
        );
        assert_eq!(ys.shape(), &[1, 4, 4, 3]);
        // 红色 → BGR 中的第 3 通道
        assert!((ys[[0, 2, 3, 2]] - (255.0 - 123.68)).abs() < 1e-3);
        assert!((ys[[0, 0, 0, 0]] + 103.939).abs() < 1e-3);
        assert!((ys[[0, 1, 1, 1]] + 116.779).abs() < 1e-3);
    }

    #[test]
    fn test_caffe_preprocess_nchw() {
        let ys = classifier_input(
            &[solid(2, 2, [0, 0, 255]), solid(3, 3, [0, 0, 0])],
            2,
            2,
            Layout::Nchw,
            Preprocess::Caffe,
        );
        assert_eq!(ys.shape(), &[2, 3, 2, 2]);
        assert!((ys[[0, 0, 1, 1]] - (255.0 - 103.939)).abs() < 1e-3);
        assert!((ys[[1, 2, 0, 0]] + 123.68).abs() < 1e-3);
    }

    #[test]
    fn test_config_defaults() {
        let config = ClassifierConfig::new("model.onnx");
        assert_eq!((config.height, config.width), (224, 224));
        assert_eq!(config.layout, Layout::Nhwc);
        assert_eq!(config.preprocess, Preprocess::Raw);
        assert!(config.cpu_fallback);
    }

    #[test]
    fn test_input_size_from_experiment() {
        let config = crate::config::parse_config(
            "seed: 1\ndata:\n  directory: data/train\n  image_size: [256, 192]\nmodel:\n  weights: model.onnx\n  input_shape: [224, 224, 3]\n  preprocess: caffe\n",
        )
        .unwrap();
        let classifier = ClassifierConfig::from_experiment(&config);
        assert_eq!((classifier.height, classifier.width), (256, 192));
        assert_eq!(classifier.preprocess, Preprocess::Caffe);
        assert_eq!(classifier.weights, "model.onnx");
    }

    #[test]
    fn test_input_size_falls_back_to_input_shape() {
        let config = crate::config::parse_config(
            "seed: 1\ndata:\n  directory: data/train\nmodel:\n  input_shape: [299, 320, 3]\n",
        )
        .unwrap();
        let classifier = ClassifierConfig::from_experiment(&config);
        assert_eq!((classifier.height, classifier.width), (299, 320));
        assert_eq!(classifier.preprocess, Preprocess::Raw);
    }

    #[test]
    fn test_imagenet_weights_rejected() {
        assert!(ResNet50::new(ClassifierConfig::new("imagenet")).is_err());
    }
}
