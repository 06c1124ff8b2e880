//! IIDC 视频相关的强类型枚举
//!
//! 数值与 libdc1394 头文件 (`dc1394/types.h`, `dc1394/video.h`) 中的定义一一对应，
//! 后端可以直接用 `raw()` / `from_raw()` 在两者之间转换。

use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// IEEE-1394 等时 (isochronous) 传输速率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum IsoSpeed {
    S100,
    S200,
    #[default]
    S400,
    S800,
    S1600,
    S3200,
}

impl IsoSpeed {
    pub const ALL: [IsoSpeed; 6] = [
        Self::S100,
        Self::S200,
        Self::S400,
        Self::S800,
        Self::S1600,
        Self::S3200,
    ];

    /// DC1394_ISO_SPEED_*
    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub const fn mbps(self) -> u32 {
        100 << (self as u32)
    }
}

impl fmt::Display for IsoSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.mbps())
    }
}

/// 固定帧率 (仅用于非 Format7 模式)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum FrameRate {
    F1_875,
    F3_75,
    F7_5,
    F15,
    F30,
    F60,
    F120,
    F240,
}

impl FrameRate {
    const RAW_BASE: u32 = 32;

    pub const ALL: [FrameRate; 8] = [
        Self::F1_875,
        Self::F3_75,
        Self::F7_5,
        Self::F15,
        Self::F30,
        Self::F60,
        Self::F120,
        Self::F240,
    ];

    /// DC1394_FRAMERATE_*
    pub const fn raw(self) -> u32 {
        Self::RAW_BASE + self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        raw.checked_sub(Self::RAW_BASE)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    /// 每秒帧数 (1.875 * 2^n)
    pub fn fps(self) -> f64 {
        1.875 * f64::from(1u32 << (self as u32))
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.fps())
    }
}

/// 色彩编码 (dc1394color_coding_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ColorCoding {
    Mono8,
    Yuv411,
    Yuv422,
    Yuv444,
    Rgb8,
    Mono16,
    Rgb16,
    Mono16S,
    Rgb16S,
    Raw8,
    Raw16,
}

impl ColorCoding {
    const RAW_BASE: u32 = 352;

    const ALL: [ColorCoding; 11] = [
        Self::Mono8,
        Self::Yuv411,
        Self::Yuv422,
        Self::Yuv444,
        Self::Rgb8,
        Self::Mono16,
        Self::Rgb16,
        Self::Mono16S,
        Self::Rgb16S,
        Self::Raw8,
        Self::Raw16,
    ];

    pub const fn raw(self) -> u32 {
        Self::RAW_BASE + self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        raw.checked_sub(Self::RAW_BASE)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    /// 每像素比特数，用于估算帧大小
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Mono8 | Self::Raw8 => 8,
            Self::Yuv411 => 12,
            Self::Yuv422 | Self::Mono16 | Self::Mono16S | Self::Raw16 => 16,
            Self::Yuv444 | Self::Rgb8 => 24,
            Self::Rgb16 | Self::Rgb16S => 48,
        }
    }
}

impl fmt::Display for ColorCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mono8 => "MONO8",
            Self::Yuv411 => "YUV411",
            Self::Yuv422 => "YUV422",
            Self::Yuv444 => "YUV444",
            Self::Rgb8 => "RGB8",
            Self::Mono16 => "MONO16",
            Self::Rgb16 => "RGB16",
            Self::Mono16S => "MONO16S",
            Self::Rgb16S => "RGB16S",
            Self::Raw8 => "RAW8",
            Self::Raw16 => "RAW16",
        };
        f.write_str(name)
    }
}

/// 视频模式 (dc1394video_mode_t)
///
/// Format0..2 是固定分辨率/编码的模式；Format7 是可缩放 (partial scan) 模式，
/// 其分辨率和编码需要额外查询。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum VideoMode {
    Mode160x120Yuv444,
    Mode320x240Yuv422,
    Mode640x480Yuv411,
    Mode640x480Yuv422,
    Mode640x480Rgb8,
    Mode640x480Mono8,
    Mode640x480Mono16,
    Mode800x600Yuv422,
    Mode800x600Rgb8,
    Mode800x600Mono8,
    Mode1024x768Yuv422,
    Mode1024x768Rgb8,
    Mode1024x768Mono8,
    Mode800x600Mono16,
    Mode1024x768Mono16,
    Mode1280x960Yuv422,
    Mode1280x960Rgb8,
    Mode1280x960Mono8,
    Mode1600x1200Yuv422,
    Mode1600x1200Rgb8,
    Mode1600x1200Mono8,
    Mode1280x960Mono16,
    Mode1600x1200Mono16,
    Exif,
    /// Format7_0 .. Format7_7，槽位只能是 0..=7
    ///
    /// 越界的槽位得不到合法的 libdc1394 代码，从外部输入构造时请用
    /// [`VideoMode::format7`]。
    Format7(u8),
}

impl VideoMode {
    const RAW_BASE: u32 = 64;
    const RAW_FORMAT7_0: u32 = 88;
    const FORMAT7_COUNT: u32 = 8;

    const FIXED: [VideoMode; 24] = [
        Self::Mode160x120Yuv444,
        Self::Mode320x240Yuv422,
        Self::Mode640x480Yuv411,
        Self::Mode640x480Yuv422,
        Self::Mode640x480Rgb8,
        Self::Mode640x480Mono8,
        Self::Mode640x480Mono16,
        Self::Mode800x600Yuv422,
        Self::Mode800x600Rgb8,
        Self::Mode800x600Mono8,
        Self::Mode1024x768Yuv422,
        Self::Mode1024x768Rgb8,
        Self::Mode1024x768Mono8,
        Self::Mode800x600Mono16,
        Self::Mode1024x768Mono16,
        Self::Mode1280x960Yuv422,
        Self::Mode1280x960Rgb8,
        Self::Mode1280x960Mono8,
        Self::Mode1600x1200Yuv422,
        Self::Mode1600x1200Rgb8,
        Self::Mode1600x1200Mono8,
        Self::Mode1280x960Mono16,
        Self::Mode1600x1200Mono16,
        Self::Exif,
    ];

    pub fn raw(self) -> u32 {
        match self {
            Self::Format7(n) => Self::RAW_FORMAT7_0 + u32::from(n),
            fixed => {
                let pos = Self::FIXED.iter().position(|m| *m == fixed).unwrap_or(0);
                Self::RAW_BASE + pos as u32
            }
        }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        if (Self::RAW_FORMAT7_0..Self::RAW_FORMAT7_0 + Self::FORMAT7_COUNT).contains(&raw) {
            return Some(Self::Format7((raw - Self::RAW_FORMAT7_0) as u8));
        }
        raw.checked_sub(Self::RAW_BASE)
            .and_then(|i| Self::FIXED.get(i as usize).copied())
    }

    /// 检查槽位范围的 Format7 构造
    pub fn format7(slot: u8) -> Option<Self> {
        (u32::from(slot) < Self::FORMAT7_COUNT).then_some(Self::Format7(slot))
    }

    /// 是否对应一个合法的 libdc1394 模式代码
    pub fn is_valid(self) -> bool {
        match self {
            Self::Format7(slot) => u32::from(slot) < Self::FORMAT7_COUNT,
            _ => true,
        }
    }

    /// 是否为可缩放 (Format7) 模式
    pub fn is_scalable(self) -> bool {
        matches!(self, Self::Format7(_))
    }

    /// 固定模式的标称 (宽, 高, 编码)
    ///
    /// Format7 与 EXIF 没有固定值，返回 `None`。
    pub fn nominal(self) -> Option<(u32, u32, ColorCoding)> {
        use ColorCoding::*;
        let entry = match self {
            Self::Mode160x120Yuv444 => (160, 120, Yuv444),
            Self::Mode320x240Yuv422 => (320, 240, Yuv422),
            Self::Mode640x480Yuv411 => (640, 480, Yuv411),
            Self::Mode640x480Yuv422 => (640, 480, Yuv422),
            Self::Mode640x480Rgb8 => (640, 480, Rgb8),
            Self::Mode640x480Mono8 => (640, 480, Mono8),
            Self::Mode640x480Mono16 => (640, 480, Mono16),
            Self::Mode800x600Yuv422 => (800, 600, Yuv422),
            Self::Mode800x600Rgb8 => (800, 600, Rgb8),
            Self::Mode800x600Mono8 => (800, 600, Mono8),
            Self::Mode1024x768Yuv422 => (1024, 768, Yuv422),
            Self::Mode1024x768Rgb8 => (1024, 768, Rgb8),
            Self::Mode1024x768Mono8 => (1024, 768, Mono8),
            Self::Mode800x600Mono16 => (800, 600, Mono16),
            Self::Mode1024x768Mono16 => (1024, 768, Mono16),
            Self::Mode1280x960Yuv422 => (1280, 960, Yuv422),
            Self::Mode1280x960Rgb8 => (1280, 960, Rgb8),
            Self::Mode1280x960Mono8 => (1280, 960, Mono8),
            Self::Mode1600x1200Yuv422 => (1600, 1200, Yuv422),
            Self::Mode1600x1200Rgb8 => (1600, 1200, Rgb8),
            Self::Mode1600x1200Mono8 => (1600, 1200, Mono8),
            Self::Mode1280x960Mono16 => (1280, 960, Mono16),
            Self::Mode1600x1200Mono16 => (1600, 1200, Mono16),
            Self::Exif | Self::Format7(_) => return None,
        };
        Some(entry)
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.nominal()) {
            (Self::Format7(n), _) => write!(f, "FORMAT7_{}", n),
            (_, Some((w, h, coding))) => write!(f, "{}x{}_{}", w, h, coding),
            _ => f.write_str("EXIF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_match_libdc1394() {
        assert_eq!(IsoSpeed::S400.raw(), 2);
        assert_eq!(FrameRate::F1_875.raw(), 32);
        assert_eq!(FrameRate::F240.raw(), 39);
        assert_eq!(ColorCoding::Mono8.raw(), 352);
        assert_eq!(ColorCoding::Raw16.raw(), 362);
        assert_eq!(VideoMode::Mode160x120Yuv444.raw(), 64);
        assert_eq!(VideoMode::Mode640x480Mono8.raw(), 69);
        assert_eq!(VideoMode::Exif.raw(), 87);
        assert_eq!(VideoMode::Format7(0).raw(), 88);
        assert_eq!(VideoMode::Format7(7).raw(), 95);
    }

    #[test]
    fn from_raw_rejects_unknown_codes() {
        assert_eq!(VideoMode::from_raw(69), Some(VideoMode::Mode640x480Mono8));
        assert_eq!(VideoMode::from_raw(90), Some(VideoMode::Format7(2)));
        assert_eq!(VideoMode::from_raw(96), None);
        assert_eq!(VideoMode::from_raw(10), None);
        assert_eq!(FrameRate::from_raw(31), None);
        assert_eq!(ColorCoding::from_raw(363), None);
        assert_eq!(IsoSpeed::from_raw(6), None);
    }

    #[test]
    fn frame_rates_are_ordered_by_throughput() {
        assert_eq!(FrameRate::F30.fps(), 30.0);
        assert_eq!(FrameRate::F240.fps(), 240.0);
        assert!(FrameRate::F15 < FrameRate::F30);
        assert_eq!(IsoSpeed::S800.mbps(), 800);
    }

    #[test]
    fn format7_slot_is_range_checked() {
        assert_eq!(VideoMode::format7(7), Some(VideoMode::Format7(7)));
        assert_eq!(VideoMode::format7(8), None);
        assert!(VideoMode::Format7(0).is_valid());
        assert!(!VideoMode::Format7(8).is_valid());
        assert!(VideoMode::Exif.is_valid());
    }

    #[test]
    fn only_format7_is_scalable() {
        assert!(VideoMode::Format7(3).is_scalable());
        assert!(!VideoMode::Mode1024x768Rgb8.is_scalable());
        assert_eq!(
            VideoMode::Mode1024x768Rgb8.nominal(),
            Some((1024, 768, ColorCoding::Rgb8))
        );
        assert_eq!(VideoMode::Format7(0).nominal(), None);
    }
}
