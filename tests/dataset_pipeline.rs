// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 端到端: 划分 → 裁剪 → 预测, 用桩模型替代 ONNX 推理

use std::fs;
use std::path::Path;

use anyhow::Result;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::{Array, IxDyn};

use car_classifier_rs::crop::crop_dataset;
use car_classifier_rs::dataset::split_dataset;
use car_classifier_rs::detection::{
    select_primary_box, AcceptedClasses, BBox, CocoClass, Detection, FrameSize, PixelBox,
    VehicleLocator,
};
use car_classifier_rs::evaluation::{accuracy, predict_from_folder};
use car_classifier_rs::models::{Embedding, Model};

fn write_image(path: &Path, w: u32, h: u32) {
    RgbImage::from_pixel(w, h, Rgb([120, 60, 30]))
        .save(path)
        .unwrap();
}

/// 固定检测结果: 一个大卡车 + 一个更大的人 + 一个小车
struct FixedDetections;

impl VehicleLocator for FixedDetections {
    fn vehicle_coordinates(&mut self, img: &DynamicImage) -> Result<PixelBox> {
        let detections = vec![
            Detection::new(CocoClass::TRUCK, BBox::new(4.0, 2.0, 28.9, 20.5)),
            Detection::new(CocoClass::PERSON, BBox::new(0.0, 0.0, 40.0, 30.0)),
            Detection::new(CocoClass::CAR, BBox::new(1.0, 1.0, 5.0, 5.0)),
        ];
        Ok(select_primary_box(
            &detections,
            FrameSize::of(img),
            &AcceptedClasses::vehicles(),
        ))
    }
}

/// 按图片宽度分类: 宽 > 高 → 类别 0, 否则类别 1
struct AspectClassifier;

impl Model for AspectClassifier {
    type Output = Embedding;

    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        let wide: Vec<f32> = images
            .iter()
            .map(|img| if img.width() > img.height() { 1.0 } else { 0.0 })
            .collect();
        Ok(Array::from_shape_vec(IxDyn(&[images.len()]), wide)?)
    }

    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Vec<Array<f32, IxDyn>>> {
        Ok(vec![xs])
    }

    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        _xs0: &[DynamicImage],
    ) -> Result<Vec<Embedding>> {
        Ok(xs[0]
            .iter()
            .map(|&wide| {
                Embedding::new(Array::from_shape_vec(IxDyn(&[2]), vec![wide, 1.0 - wide]).unwrap())
            })
            .collect())
    }

    fn summary(&self) {}
}

#[test]
fn split_crop_and_predict() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("car_ims");
    fs::create_dir_all(&raw).unwrap();
    write_image(&raw.join("000001.jpg"), 40, 30);
    write_image(&raw.join("000002.jpg"), 30, 40);
    write_image(&raw.join("000003.jpg"), 40, 30);

    let labels = root.path().join("car_dataset_labels.csv");
    fs::write(
        &labels,
        "img_name,class,subset\n\
         000001.jpg,Wide Sedan,train\n\
         000002.jpg,Tall Van,train\n\
         000003.jpg,Wide Sedan,test\n",
    )
    .unwrap();

    // 划分
    let split = root.path().join("car_ims_v1");
    let summary = split_dataset(&raw, &labels, &split).unwrap();
    assert_eq!(summary.linked, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.folders, 4);
    assert!(split.join("train/Wide Sedan/000001.jpg").is_file());
    assert!(split.join("train/Tall Van/000002.jpg").is_file());
    assert!(split.join("test/Wide Sedan/000003.jpg").is_file());
    assert!(split.join("test/Tall Van").is_dir());

    let again = split_dataset(&raw, &labels, &split).unwrap();
    assert_eq!(again.linked, 0);
    assert_eq!(again.skipped, 3);

    // 裁剪: 选中卡车框 (4, 2, 28, 20)
    let cropped = root.path().join("car_ims_v2");
    let summary = crop_dataset(&mut FixedDetections, &split, &cropped).unwrap();
    assert_eq!(summary.cropped, 3);
    let out = image::open(cropped.join("train/Wide Sedan/000001.jpg")).unwrap();
    assert_eq!(out.dimensions(), (24, 18));
    let out = image::open(cropped.join("train/Tall Van/000002.jpg")).unwrap();
    assert_eq!(out.dimensions(), (24, 18));

    let again = crop_dataset(&mut FixedDetections, &split, &cropped).unwrap();
    assert_eq!(again.cropped, 0);
    assert_eq!(again.skipped, 3);

    // 预测: 原始划分目录 (未裁剪, 宽高比保留)
    let classes = vec!["Wide Sedan".to_string(), "Tall Van".to_string()];
    let (predictions, truth) =
        predict_from_folder(split.join("train"), &mut AspectClassifier, &classes).unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions, truth);
    assert_eq!(accuracy(&predictions, &truth), 1.0);
}

#[test]
fn crop_falls_back_to_full_image_without_vehicles() {
    struct NoVehicles;
    impl VehicleLocator for NoVehicles {
        fn vehicle_coordinates(&mut self, img: &DynamicImage) -> Result<PixelBox> {
            let detections = vec![Detection::new(CocoClass::DOG, BBox::new(1.0, 1.0, 9.0, 9.0))];
            Ok(select_primary_box(
                &detections,
                FrameSize::of(img),
                &AcceptedClasses::vehicles(),
            ))
        }
    }

    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("in/Some Class");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 17, 11);

    let output = root.path().join("out");
    crop_dataset(&mut NoVehicles, root.path().join("in"), &output).unwrap();
    let out = image::open(output.join("Some Class/a.png")).unwrap();
    assert_eq!(out.dimensions(), (17, 11));
}
