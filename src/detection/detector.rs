// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 车辆检测器 (Vehicle Detector)
//! 职责: 图片 → YOLOv8 (COCO) 检测 → 主体车辆框

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use ndarray::{Array, ArrayView2, Axis, Ix2, IxDyn};

use super::selector::select_primary_box;
use super::types::{BBox, Detection, FrameSize, PixelBox};
use super::vocabulary::{AcceptedClasses, Vocabulary};
use super::VehicleLocator;
use crate::models::Model;
use crate::{non_max_suppression, Device, OrtBackend, OrtConfig};

/// YOLOv8推理输入尺寸
pub const INF_SIZE: u32 = 640;

/// 检测器参数
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// ONNX 模型路径
    pub model: String,
    pub device: Device,
    pub device_id: i32,
    /// 加速器失败时回退 CPU
    pub cpu_fallback: bool,
    pub width: u32,
    pub height: u32,
    /// 置信度阈值
    pub conf: f32,
    /// NMS IOU阈值
    pub iou: f32,
    /// 视为"车辆"的类别名称
    pub accepted_classes: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            device: Device::Cpu,
            device_id: 0,
            cpu_fallback: true,
            width: INF_SIZE,
            height: INF_SIZE,
            conf: 0.5,
            iou: 0.45,
            accepted_classes: AcceptedClasses::VEHICLE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// Letterbox 预处理: 等比缩放贴到左上角, 其余填充灰色 (144/255), NCHW, [0, 1]
pub fn letterbox(images: &[DynamicImage], width: u32, height: u32) -> Array<f32, IxDyn> {
    let mut ys = Array::from_elem(
        (images.len(), 3, height as usize, width as usize),
        144.0f32 / 255.0,
    )
    .into_dyn();

    for (idx, x) in images.iter().enumerate() {
        let (w0, h0) = x.dimensions();
        let (_, w_new, h_new) = scale_wh(w0 as f32, h0 as f32, width as f32, height as f32);
        let img = x.resize_exact(
            (w_new as u32).clamp(1, width),
            (h_new as u32).clamp(1, height),
            FilterType::Triangle,
        );

        for (x, y, rgb) in img.pixels() {
            let x = x as usize;
            let y = y as usize;
            let [r, g, b, _] = rgb.0;
            ys[[idx, 0, y, x]] = (r as f32) / 255.0;
            ys[[idx, 1, y, x]] = (g as f32) / 255.0;
            ys[[idx, 2, y, x]] = (b as f32) / 255.0;
        }
    }

    ys
}

/// YOLOv8 检测头后处理
///
/// 输出张量 `[batch, 4 + nc, anchors]`, 每列为 `cx, cy, w, h, cls0..clsN`
#[derive(Debug, Clone, Copy)]
pub struct YOLOv8Postprocessor {
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    pub iou: f32,
}

impl YOLOv8Postprocessor {
    pub fn postprocess(
        &self,
        xs: &[Array<f32, IxDyn>],
        xs0: &[DynamicImage],
    ) -> Result<Vec<Vec<Detection>>> {
        let preds = xs.first().context("detector produced no outputs")?;
        if preds.ndim() != 3 {
            bail!(
                "unexpected detector output shape {:?}, expected [batch, 4 + nc, anchors]",
                preds.shape()
            );
        }

        let mut ys = Vec::with_capacity(xs0.len());
        for (idx, anchor) in preds.axis_iter(Axis(0)).enumerate() {
            let img = xs0
                .get(idx)
                .with_context(|| format!("no source image for batch index {}", idx))?;
            let anchor = anchor.into_dimensionality::<Ix2>()?;
            ys.push(self.decode(anchor, FrameSize::of(img)));
        }
        Ok(ys)
    }

    /// 解码单张图的预测 `[4 + nc, anchors]`, 坐标还原到原图并经过 NMS
    pub fn decode(&self, preds: ArrayView2<'_, f32>, frame: FrameSize) -> Vec<Detection> {
        const CXYWH_OFFSET: usize = 4;
        let width_original = frame.width as f32;
        let height_original = frame.height as f32;
        let ratio =
            (self.width as f32 / width_original).min(self.height as f32 / height_original);

        let mut data = Vec::new();
        for pred in preds.axis_iter(Axis(1)) {
            let (id, confidence) = pred.iter().skip(CXYWH_OFFSET).enumerate().fold(
                (0usize, f32::NEG_INFINITY),
                |max, (i, &c)| if c > max.1 { (i, c) } else { max },
            );
            if confidence < self.conf {
                continue;
            }

            let cx = pred[0] / ratio;
            let cy = pred[1] / ratio;
            let w = pred[2] / ratio;
            let h = pred[3] / ratio;
            let bbox = BBox::new(
                (cx - w / 2.).clamp(0., width_original),
                (cy - h / 2.).clamp(0., height_original),
                (cx + w / 2.).clamp(0., width_original),
                (cy + h / 2.).clamp(0., height_original),
            );
            data.push(Detection::new(id, bbox).with_confidence(confidence));
        }

        non_max_suppression(&mut data, self.iou);
        data
    }
}

/// 车辆检测器: 显式持有的检测模型句柄, 进程启动时构造一次
pub struct VehicleDetector {
    engine: OrtBackend,
    postprocessor: YOLOv8Postprocessor,
    vocabulary: Vocabulary,
    accepted: AcceptedClasses,
}

impl VehicleDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let vocabulary = Vocabulary::coco80();
        let accepted = AcceptedClasses::from_names(&vocabulary, &config.accepted_classes)?;

        let engine = OrtBackend::build(OrtConfig {
            ep: config.device.ep(config.device_id),
            f: config.model,
            cpu_fallback: config.cpu_fallback,
        })?;

        Ok(Self {
            engine,
            postprocessor: YOLOv8Postprocessor {
                width: config.width,
                height: config.height,
                conf: config.conf,
                iou: config.iou,
            },
            vocabulary,
            accepted,
        })
    }

    /// 单张图的全部检测结果 (按置信度降序)
    pub fn detect(&mut self, img: &DynamicImage) -> Result<Vec<Detection>> {
        let mut ys = self.forward(std::slice::from_ref(img))?;
        Ok(ys.pop().unwrap_or_default())
    }
}

impl VehicleLocator for VehicleDetector {
    fn vehicle_coordinates(&mut self, img: &DynamicImage) -> Result<PixelBox> {
        let detections = self.detect(img)?;
        let frame = FrameSize::of(img);
        let b = select_primary_box(&detections, frame, &self.accepted);
        debug!(
            "🚗 {} 个检测, 选中 {:?} (画面 {}x{})",
            detections.len(),
            b.as_tuple(),
            frame.width,
            frame.height
        );
        Ok(b)
    }
}

impl Model for VehicleDetector {
    type Output = Vec<Detection>;

    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        Ok(letterbox(
            images,
            self.postprocessor.width,
            self.postprocessor.height,
        ))
    }

    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Vec<Array<f32, IxDyn>>> {
        self.engine.run(xs)
    }

    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<Self::Output>> {
        self.postprocessor.postprocess(&xs, xs0)
    }

    fn summary(&self) {
        let names: Vec<&str> = self
            .accepted
            .ids()
            .iter()
            .filter_map(|&id| self.vocabulary.name_of(id))
            .collect();
        info!(
            "🚗 车辆检测器: {} | 设备: {} | 输入: {}x{} | conf: {:.2} | iou: {:.2} | 类别: {:?} ({})",
            self.engine.model_path(),
            self.engine.ep(),
            self.postprocessor.width,
            self.postprocessor.height,
            self.postprocessor.conf,
            self.postprocessor.iou,
            names,
            self.vocabulary.version(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::CocoClass;
    use image::{Rgb, RgbImage};
    use ndarray::Array2;

    fn postprocessor() -> YOLOv8Postprocessor {
        YOLOv8Postprocessor {
            width: 640,
            height: 640,
            conf: 0.5,
            iou: 0.45,
        }
    }

    fn set_anchor(preds: &mut Array2<f32>, col: usize, cxywh: [f32; 4], class_id: usize, score: f32) {
        for (row, v) in cxywh.iter().enumerate() {
            preds[[row, col]] = *v;
        }
        preds[[4 + class_id, col]] = score;
    }

    #[test]
    fn test_decode_threshold_and_nms() {
        let mut preds = Array2::<f32>::zeros((4 + 8, 3));
        set_anchor(&mut preds, 0, [100., 100., 50., 40.], CocoClass::CAR, 0.9);
        // 与第一个框重叠, 置信度更低, 被 NMS 抑制
        set_anchor(&mut preds, 1, [102., 100., 50., 40.], CocoClass::TRUCK, 0.6);
        // 低于阈值
        set_anchor(&mut preds, 2, [400., 400., 80., 80.], CocoClass::CAR, 0.3);

        let ys = postprocessor().decode(preds.view(), FrameSize::new(640, 640));
        assert_eq!(ys.len(), 1);
        assert_eq!(ys[0].class_id, CocoClass::CAR);
        assert_eq!(ys[0].bbox, BBox::new(75., 80., 125., 120.));
        assert!((ys[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rescales_to_original() {
        let mut preds = Array2::<f32>::zeros((4 + 8, 1));
        set_anchor(&mut preds, 0, [100., 100., 40., 20.], CocoClass::TRUCK, 0.8);

        // 1280x960 → 640x480, ratio = 0.5
        let ys = postprocessor().decode(preds.view(), FrameSize::new(1280, 960));
        assert_eq!(ys.len(), 1);
        assert_eq!(ys[0].bbox, BBox::new(160., 180., 240., 220.));
    }

    #[test]
    fn test_decode_clamps_to_frame() {
        let mut preds = Array2::<f32>::zeros((4 + 8, 1));
        set_anchor(&mut preds, 0, [10., 630., 40., 40.], CocoClass::CAR, 0.7);
        let ys = postprocessor().decode(preds.view(), FrameSize::new(640, 640));
        assert_eq!(ys[0].bbox, BBox::new(0., 610., 30., 640.));
    }

    #[test]
    fn test_decode_keeps_confidence_order() {
        let mut preds = Array2::<f32>::zeros((4 + 8, 2));
        set_anchor(&mut preds, 0, [100., 100., 20., 20.], CocoClass::CAR, 0.6);
        set_anchor(&mut preds, 1, [400., 400., 20., 20.], CocoClass::CAR, 0.95);
        let ys = postprocessor().decode(preds.view(), FrameSize::new(640, 640));
        assert_eq!(ys.len(), 2);
        assert!(ys[0].confidence > ys[1].confidence);
    }

    #[test]
    fn test_postprocess_rejects_bad_shape() {
        let xs = vec![Array::<f32, _>::zeros(IxDyn(&[12, 3]))];
        let img = DynamicImage::new_rgb8(4, 4);
        assert!(postprocessor().postprocess(&xs, &[img]).is_err());
    }

    #[test]
    fn test_letterbox() {
        // 4x2 红色图 → 8x8 输入: 缩放为 8x4, 下半部分为灰色填充
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])));
        let ys = letterbox(&[img], 8, 8);
        assert_eq!(ys.shape(), &[1, 3, 8, 8]);
        assert!((ys[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!(ys[[0, 1, 3, 7]].abs() < 0.01);
        assert!((ys[[0, 0, 6, 0]] - 144.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.width, INF_SIZE);
        assert_eq!(config.conf, 0.5);
        assert_eq!(config.accepted_classes, vec!["car", "truck"]);
    }
}
