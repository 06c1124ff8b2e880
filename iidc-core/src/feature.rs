use bitflags::bitflags;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// 相机可控参数 (dc1394feature_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Feature {
    Brightness,
    Exposure,
    Sharpness,
    WhiteBalance,
    Hue,
    Saturation,
    Gamma,
    Shutter,
    Gain,
    Iris,
    Focus,
    Temperature,
    Trigger,
    TriggerDelay,
    WhiteShading,
    FrameRate,
    Zoom,
    Pan,
    Tilt,
    OpticalFilter,
    CaptureSize,
    CaptureQuality,
}

impl Feature {
    const RAW_BASE: u32 = 416;

    pub const ALL: [Feature; 22] = [
        Self::Brightness,
        Self::Exposure,
        Self::Sharpness,
        Self::WhiteBalance,
        Self::Hue,
        Self::Saturation,
        Self::Gamma,
        Self::Shutter,
        Self::Gain,
        Self::Iris,
        Self::Focus,
        Self::Temperature,
        Self::Trigger,
        Self::TriggerDelay,
        Self::WhiteShading,
        Self::FrameRate,
        Self::Zoom,
        Self::Pan,
        Self::Tilt,
        Self::OpticalFilter,
        Self::CaptureSize,
        Self::CaptureQuality,
    ];

    pub const fn raw(self) -> u32 {
        Self::RAW_BASE + self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        raw.checked_sub(Self::RAW_BASE)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Exposure => "exposure",
            Self::Sharpness => "sharpness",
            Self::WhiteBalance => "white_balance",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Gamma => "gamma",
            Self::Shutter => "shutter",
            Self::Gain => "gain",
            Self::Iris => "iris",
            Self::Focus => "focus",
            Self::Temperature => "temperature",
            Self::Trigger => "trigger",
            Self::TriggerDelay => "trigger_delay",
            Self::WhiteShading => "white_shading",
            Self::FrameRate => "frame_rate",
            Self::Zoom => "zoom",
            Self::Pan => "pan",
            Self::Tilt => "tilt",
            Self::OpticalFilter => "optical_filter",
            Self::CaptureSize => "capture_size",
            Self::CaptureQuality => "capture_quality",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature 的控制模式 (dc1394feature_mode_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum FeatureMode {
    Manual,
    Auto,
    OnePushAuto,
}

impl FeatureMode {
    const RAW_BASE: u32 = 736;

    pub const fn raw(self) -> u32 {
        Self::RAW_BASE + self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw.checked_sub(Self::RAW_BASE)? {
            0 => Some(Self::Manual),
            1 => Some(Self::Auto),
            2 => Some(Self::OnePushAuto),
            _ => None,
        }
    }

    pub const fn flag(self) -> FeatureModes {
        match self {
            Self::Manual => FeatureModes::MANUAL,
            Self::Auto => FeatureModes::AUTO,
            Self::OnePushAuto => FeatureModes::ONE_PUSH_AUTO,
        }
    }
}

bitflags! {
    /// 某个 Feature 支持的模式集合 (dc1394_feature_get_modes)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatureModes: u8 {
        const MANUAL = 0b001;
        const AUTO = 0b010;
        const ONE_PUSH_AUTO = 0b100;
    }
}

impl FeatureModes {
    /// 按 Manual, Auto, OnePushAuto 的顺序列出
    pub fn modes(self) -> impl Iterator<Item = FeatureMode> {
        [FeatureMode::Manual, FeatureMode::Auto, FeatureMode::OnePushAuto]
            .into_iter()
            .filter(move |m| self.contains(m.flag()))
    }
}

impl FromIterator<FeatureMode> for FeatureModes {
    fn from_iter<I: IntoIterator<Item = FeatureMode>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FeatureModes::empty(), |acc, m| acc | m.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_codes_match_libdc1394() {
        assert_eq!(Feature::Brightness.raw(), 416);
        assert_eq!(Feature::Shutter.raw(), 423);
        assert_eq!(Feature::Gain.raw(), 424);
        assert_eq!(Feature::CaptureQuality.raw(), 437);
        assert_eq!(Feature::from_raw(438), None);
        assert_eq!(FeatureMode::OnePushAuto.raw(), 738);
    }

    #[test]
    fn feature_modes_collect_and_iterate() {
        let set: FeatureModes = [FeatureMode::Auto, FeatureMode::Manual].into_iter().collect();
        assert_eq!(set, FeatureModes::MANUAL | FeatureModes::AUTO);
        let listed: Vec<_> = set.modes().collect();
        assert_eq!(listed, vec![FeatureMode::Manual, FeatureMode::Auto]);
    }
}
