// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测器标签词表 (COCO 80 类) 与车辆类别集合

use anyhow::{bail, Result};

/// COCO 80 类名称, 顺序即检测器输出的类别索引
pub const COCO_NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// COCO 词表中常用的类别索引
pub struct CocoClass;

impl CocoClass {
    pub const PERSON: usize = 0;
    pub const CAR: usize = 2;
    pub const BUS: usize = 5;
    pub const TRUCK: usize = 7;
    pub const DOG: usize = 16;
}

/// 带版本号的标签词表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    version: String,
    names: Vec<String>,
}

impl Vocabulary {
    pub fn new(version: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            version: version.into(),
            names,
        }
    }

    pub fn coco80() -> Self {
        Self::new("coco-80", COCO_NAMES.iter().map(|s| s.to_string()).collect())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::coco80()
    }
}

/// 选择器接受的类别集合 (默认: car + truck)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedClasses {
    ids: Vec<usize>,
}

impl AcceptedClasses {
    pub const VEHICLE_NAMES: [&'static str; 2] = ["car", "truck"];

    pub fn new(ids: Vec<usize>) -> Self {
        Self { ids }
    }

    /// COCO 词表下的车辆类别
    pub fn vehicles() -> Self {
        Self::new(vec![CocoClass::CAR, CocoClass::TRUCK])
    }

    /// 按名称在词表中解析类别, 未知名称视为配置错误
    pub fn from_names<S: AsRef<str>>(vocabulary: &Vocabulary, names: &[S]) -> Result<Self> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match vocabulary.id_of(name) {
                Some(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                None => bail!(
                    "unknown class `{}` in vocabulary {}",
                    name,
                    vocabulary.version()
                ),
            }
        }
        Ok(Self { ids })
    }

    pub fn contains(&self, class_id: usize) -> bool {
        self.ids.contains(&class_id)
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }
}

impl Default for AcceptedClasses {
    fn default() -> Self {
        Self::vehicles()
    }
}
