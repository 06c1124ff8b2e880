use std::collections::HashMap;

use iidc_core::feature::{Feature, FeatureMode, FeatureModes};
use iidc_core::traits::CameraId;
use iidc_core::video::{ColorCoding, FrameRate, VideoMode};

/// 仿真相机支持的一个视频模式
#[derive(Debug, Clone, PartialEq)]
pub struct SimMode {
    pub mode: VideoMode,
    pub coding: ColorCoding,
    pub width: u32,
    pub height: u32,
    pub frame_rates: Vec<FrameRate>,
}

/// 仿真 Feature 寄存器
#[derive(Debug, Clone, PartialEq)]
pub struct SimFeature {
    pub value: u32,
    pub min: u32,
    pub max: u32,
    pub readable: bool,
    pub switchable: bool,
    pub power: bool,
    pub modes: FeatureModes,
    pub mode: FeatureMode,
}

impl SimFeature {
    /// 可读、可开关、支持 Manual/Auto 的常规 Feature
    pub fn new(value: u32, min: u32, max: u32) -> Self {
        Self {
            value,
            min,
            max,
            readable: true,
            switchable: true,
            power: true,
            modes: FeatureModes::MANUAL | FeatureModes::AUTO,
            mode: FeatureMode::Manual,
        }
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn modes(mut self, modes: FeatureModes) -> Self {
        self.modes = modes;
        self
    }
}

/// 挂在仿真总线上的一台相机
#[derive(Debug, Clone, PartialEq)]
pub struct SimCamera {
    pub id: CameraId,
    pub modes: Vec<SimMode>,
    pub features: HashMap<Feature, SimFeature>,
    /// 编码/尺寸查询会失败的模式
    pub failing_modes: Vec<VideoMode>,
}

impl SimCamera {
    pub fn new(guid: u64) -> Self {
        Self {
            id: CameraId::new(guid),
            modes: Vec::new(),
            features: HashMap::new(),
            failing_modes: Vec::new(),
        }
    }

    /// 添加一个固定 (Format0..2) 模式，尺寸和编码取标称值
    ///
    /// # Panics
    /// 传入 Format7 或 EXIF 时 panic，它们没有标称值，请用 [`SimCamera::scalable_mode`]。
    pub fn mode(mut self, mode: VideoMode, frame_rates: &[FrameRate]) -> Self {
        let (width, height, coding) = mode
            .nominal()
            .unwrap_or_else(|| panic!("{} has no nominal size", mode));
        self.modes.push(SimMode {
            mode,
            coding,
            width,
            height,
            frame_rates: frame_rates.to_vec(),
        });
        self
    }

    /// 添加一个 Format7 模式
    pub fn scalable_mode(mut self, slot: u8, coding: ColorCoding, width: u32, height: u32) -> Self {
        self.modes.push(SimMode {
            mode: VideoMode::Format7(slot),
            coding,
            width,
            height,
            frame_rates: Vec::new(),
        });
        self
    }

    /// 列出一个模式，但对它的编码和尺寸查询都返回错误
    ///
    /// 用来模拟 Format7 寄存器读取失败，或者只会报 EXIF 的相机。
    pub fn failing_mode(mut self, mode: VideoMode) -> Self {
        if self.find_mode(mode).is_none() {
            self.modes.push(SimMode {
                mode,
                coding: ColorCoding::Mono8,
                width: 0,
                height: 0,
                frame_rates: Vec::new(),
            });
        }
        self.failing_modes.push(mode);
        self
    }

    pub fn feature(mut self, feature: Feature, state: SimFeature) -> Self {
        self.features.insert(feature, state);
        self
    }

    pub(crate) fn find_mode(&self, mode: VideoMode) -> Option<&SimMode> {
        self.modes.iter().find(|m| m.mode == mode)
    }
}
