// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 车辆裁剪: 对整个数据集逐张检测主体车辆并保存裁剪结果
//! 输出目录结构与输入一致

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use serde::Serialize;

use crate::dataset::walk_images;
use crate::detection::{PixelBox, VehicleLocator};

/// 按像素框裁剪, 框先限制在图像范围内; 限制后为空则返回整图
pub fn crop_to_box(img: &DynamicImage, b: PixelBox) -> DynamicImage {
    let (w, h) = img.dimensions();
    let clamp_x = |v: i32| v.clamp(0, w as i32) as u32;
    let clamp_y = |v: i32| v.clamp(0, h as i32) as u32;
    let (x1, x2) = (clamp_x(b.x1), clamp_x(b.x2));
    let (y1, y2) = (clamp_y(b.y1), clamp_y(b.y2));

    if x2 <= x1 || y2 <= y1 {
        return img.clone();
    }
    img.crop_imm(x1, y1, x2 - x1, y2 - y1)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CropSummary {
    pub cropped: usize,
    pub skipped: usize,
}

/// 遍历 `input_dir` 下全部图片, 裁剪后写入 `output_dir` 的同名相对路径
pub fn crop_dataset<L, P, Q>(locator: &mut L, input_dir: P, output_dir: Q) -> Result<CropSummary>
where
    L: VehicleLocator + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (input_dir, output_dir) = (input_dir.as_ref(), output_dir.as_ref());
    let mut summary = CropSummary::default();

    for path in walk_images(input_dir)? {
        let target = output_dir.join(path.strip_prefix(input_dir)?);
        if target.exists() {
            summary.skipped += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let img = image::open(&path)
            .with_context(|| format!("failed to load image {}", path.display()))?;
        let b = locator.vehicle_coordinates(&img)?;
        crop_to_box(&img, b)
            .save(&target)
            .with_context(|| format!("failed to save {}", target.display()))?;
        debug!("✂️ {} {:?}", path.display(), b.as_tuple());
        summary.cropped += 1;
    }

    info!(
        "✅ 裁剪完成: {} 张, 跳过 {} 张",
        summary.cropped, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0])))
    }

    #[test]
    fn test_crop_inside() {
        let img = image(100, 80);
        let out = crop_to_box(&img, PixelBox::new(10, 20, 60, 50));
        assert_eq!(out.dimensions(), (50, 30));
        assert_eq!(out.get_pixel(0, 0).0, [10, 20, 0, 255]);
    }

    #[test]
    fn test_crop_clamped_to_image() {
        let img = image(100, 80);
        let out = crop_to_box(&img, PixelBox::new(-10, 40, 150, 200));
        assert_eq!(out.dimensions(), (100, 40));
    }

    #[test]
    fn test_full_frame_box_is_identity() {
        let img = image(64, 48);
        let out = crop_to_box(&img, PixelBox::new(0, 0, 64, 48));
        assert_eq!(out, img);
    }

    #[test]
    fn test_empty_box_returns_full_image() {
        let img = image(64, 48);
        assert_eq!(crop_to_box(&img, PixelBox::new(30, 30, 30, 40)), img);
        assert_eq!(crop_to_box(&img, PixelBox::new(200, 0, 300, 48)), img);
    }
}
