// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 主体车辆选择 (Primary-Subject Selector)
//!
//! 从一张图的全部检测结果中选出"最可能是拍摄主体的那辆车":
//! 1. 只保留接受类别 (默认 car / truck) 的检测, 其余类别完全忽略
//! 2. 没有可用检测时返回整图 `[0, 0, width, height]`
//! 3. 否则返回面积最大的框, 面积相同时取输入顺序中靠前的一个
//!
//! 坐标先向零截断为整数, 面积在整数坐标上计算。

use super::types::{Detection, FrameSize, PixelBox};
use super::vocabulary::AcceptedClasses;

pub fn select_primary_box(
    detections: &[Detection],
    frame: FrameSize,
    accepted: &AcceptedClasses,
) -> PixelBox {
    let mut best: Option<(PixelBox, i64)> = None;

    for det in detections.iter().filter(|d| accepted.contains(d.class_id)) {
        let candidate = det.bbox.truncate();
        let area = candidate.area();
        // 严格大于才替换: 并列时保留先出现的
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((candidate, area)),
        }
    }

    best.map(|(b, _)| b).unwrap_or_else(|| frame.full_box())
}
