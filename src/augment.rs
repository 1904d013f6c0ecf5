// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 数据增强 (随机翻转 / 旋转 / 缩放)
//!
//! 参数语义与 Keras 预处理层一致:
//! - `random_flip`: 每个启用的方向以 50% 概率翻转
//! - `random_rotation`: 角度在 `[-factor, factor] × 2π` 内均匀采样
//! - `random_zoom`: 缩放量在 `[-f, f]` 内均匀采样, 负值放大、正值缩小;
//!   未给出 `width_factor` 时保持宽高比
//!
//! 旋转和缩小后露出的区域填充黑色, 输出尺寸与输入一致。

use std::f32::consts::PI;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    Horizontal,
    Vertical,
    #[default]
    HorizontalAndVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RandomFlip {
    #[serde(default)]
    pub mode: FlipMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomRotation {
    pub factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomZoom {
    pub height_factor: f32,
    #[serde(default)]
    pub width_factor: Option<f32>,
}

/// 实验配置中的 `data_aug_layer` 段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    #[serde(default)]
    pub random_flip: Option<RandomFlip>,
    #[serde(default)]
    pub random_rotation: Option<RandomRotation>,
    #[serde(default)]
    pub random_zoom: Option<RandomZoom>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AugmentLayer {
    Flip(FlipMode),
    Rotation { factor: f32 },
    Zoom { height_factor: f32, width_factor: Option<f32> },
}

impl AugmentLayer {
    pub fn apply<R: Rng + ?Sized>(&self, img: &RgbImage, rng: &mut R) -> RgbImage {
        match *self {
            AugmentLayer::Flip(mode) => {
                let mut out = img.clone();
                if mode != FlipMode::Vertical && rng.gen_bool(0.5) {
                    out = imageops::flip_horizontal(&out);
                }
                if mode != FlipMode::Horizontal && rng.gen_bool(0.5) {
                    out = imageops::flip_vertical(&out);
                }
                out
            }
            AugmentLayer::Rotation { factor } => {
                let theta = uniform(rng, factor) * 2.0 * PI;
                rotate_about_center(img, theta, Interpolation::Bilinear, Rgb([0, 0, 0]))
            }
            AugmentLayer::Zoom {
                height_factor,
                width_factor,
            } => {
                let h_zoom = 1.0 + uniform(rng, height_factor);
                let w_zoom = match width_factor {
                    Some(f) => 1.0 + uniform(rng, f),
                    None => h_zoom,
                };
                zoom(img, w_zoom, h_zoom)
            }
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, factor: f32) -> f32 {
    let f = factor.abs();
    rng.gen_range(-f..=f)
}

/// 内容缩放到 `1 / zoom` 后居中, 超出部分裁掉, 不足部分填黑
fn zoom(img: &RgbImage, w_zoom: f32, h_zoom: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let new_w = ((w as f32 / w_zoom.max(1e-3)).round() as u32).max(1);
    let new_h = ((h as f32 / h_zoom.max(1e-3)).round() as u32).max(1);
    let resized = imageops::resize(img, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(w, h, Rgb([0, 0, 0]));
    let x = (w as i64 - new_w as i64) / 2;
    let y = (h as i64 - new_h as i64) / 2;
    imageops::overlay(&mut canvas, &resized, x, y);
    canvas
}

/// 按配置顺序 (翻转 → 旋转 → 缩放) 串联的增强层
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Augmenter {
    layers: Vec<AugmentLayer>,
}

impl Augmenter {
    pub fn from_config(config: &AugmentationConfig) -> Self {
        let mut layers = Vec::new();
        if let Some(flip) = config.random_flip {
            layers.push(AugmentLayer::Flip(flip.mode));
        }
        if let Some(rotation) = config.random_rotation {
            layers.push(AugmentLayer::Rotation {
                factor: rotation.factor,
            });
        }
        if let Some(zoom) = config.random_zoom {
            layers.push(AugmentLayer::Zoom {
                height_factor: zoom.height_factor,
                width_factor: zoom.width_factor,
            });
        }
        Self { layers }
    }

    pub fn layers(&self) -> &[AugmentLayer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn apply<R: Rng + ?Sized>(&self, img: &DynamicImage, rng: &mut R) -> DynamicImage {
        let out = self
            .layers
            .iter()
            .fold(img.to_rgb8(), |acc, layer| layer.apply(&acc, &mut *rng));
        DynamicImage::ImageRgb8(out)
    }
}
