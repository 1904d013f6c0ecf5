// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod augment; // 数据增强
pub mod config; // 实验配置
pub mod crop; // 车辆裁剪
pub mod dataset; // 数据集划分
pub mod detection; // 车辆检测与主体选择
pub mod evaluation; // 批量预测与评估
pub mod models; // 分类模型接口与实现

pub mod ort_backend;

pub use crate::config::{ConfigError, ExperimentConfig};
pub use crate::detection::{
    select_primary_box, AcceptedClasses, BBox, Detection, FrameSize, PixelBox, VehicleDetector,
    VehicleLocator,
};
pub use crate::models::{ClassifierConfig, Embedding, Model, ResNet50};
pub use crate::ort_backend::{Device, OrtBackend, OrtConfig, OrtEP};

/// 类别无关的非极大值抑制, 结果按置信度降序
pub fn non_max_suppression(xs: &mut Vec<Detection>, iou_threshold: f32) {
    xs.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].bbox.iou(&xs[index].bbox);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

/// 本地时间字符串, 用于报告时间戳和默认文件名
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
