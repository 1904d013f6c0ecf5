// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测系统 (Detection System)
//!
//! - Vocabulary: 检测器标签词表与车辆类别
//! - Selector:   从检测结果中选出主体车辆
//! - Detector:   YOLOv8 车辆检测

pub mod detector;
pub mod selector;
pub mod types;
pub mod vocabulary;

use anyhow::Result;
use image::DynamicImage;

pub use detector::{letterbox, DetectorConfig, VehicleDetector, YOLOv8Postprocessor, INF_SIZE};
pub use selector::select_primary_box;
pub use types::{BBox, Detection, FrameSize, PixelBox};
pub use vocabulary::{AcceptedClasses, CocoClass, Vocabulary, COCO_NAMES};

/// 车辆定位: 图片 → 主体车辆框 (找不到时为整图)
pub trait VehicleLocator {
    fn vehicle_coordinates(&mut self, img: &DynamicImage) -> Result<PixelBox>;
}
