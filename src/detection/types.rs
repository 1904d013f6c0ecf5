// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统数据结构定义
/// Data structures for vehicle detection
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

// ========== 数据结构 ==========

/// 检测框 (浮点像素坐标, 左上 x1/y1, 右下 x2/y2)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.) * self.height().max(0.)
    }

    pub fn intersection_area(&self, another: &BBox) -> f32 {
        let l = self.x1.max(another.x1);
        let r = self.x2.min(another.x2);
        let t = self.y1.max(another.y1);
        let b = self.y2.min(another.y2);
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn iou(&self, another: &BBox) -> f32 {
        let inter = self.intersection_area(another);
        let union = self.area() + another.area() - inter;
        if union <= 0. {
            return 0.;
        }
        inter / union
    }

    /// 截断为整数像素坐标 (向零截断, 不四舍五入)
    pub fn truncate(&self) -> PixelBox {
        PixelBox::new(
            self.x1 as i32,
            self.y1 as i32,
            self.x2 as i32,
            self.y2 as i32,
        )
    }
}

/// 单个检测结果 (类别 + 检测框 + 置信度)
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub bbox: BBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_id: usize, bbox: BBox) -> Self {
        Self {
            class_id,
            bbox,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

/// 原图尺寸
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height }
    }

    /// 覆盖整张图的框 [0, 0, width, height]
    pub fn full_box(&self) -> PixelBox {
        PixelBox::new(0, 0, self.width as i32, self.height as i32)
    }
}

/// 整数像素框 [left, top, right, bottom], 可直接用于裁剪
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// |x2 - x1| * |y2 - y1|
    pub fn area(&self) -> i64 {
        let w = (self.x2 as i64 - self.x1 as i64).abs();
        let h = (self.y2 as i64 - self.y1 as i64).abs();
        w * h
    }

    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}
