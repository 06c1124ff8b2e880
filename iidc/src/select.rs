//! 视频模式选择
//!
//! 协商时把相机支持的全部 (编码, 宽, 高) 组合交给调用者提供的
//! [`ModeSelector`]，由它返回选中的下标。策略 (最高分辨率、指定色彩空间、
//! 询问用户...) 全部放在这里，协商代码本身不关心。

use std::fmt;

use iidc_core::error::BoxError;
use iidc_core::pixel_format::PixelFormat;
use iidc_core::video::ColorCoding;

/// 一个候选模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCandidate {
    pub coding: ColorCoding,
    pub width: u32,
    pub height: u32,
    /// Format7 模式，不支持采集
    pub scalable: bool,
}

impl ModeCandidate {
    /// 该编码对应的像素格式；没有映射时为 `None`
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        PixelFormat::try_from(self.coding).ok()
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// 能否被会话采集 (非 Format7 且有像素格式映射)
    pub fn is_usable(&self) -> bool {
        !self.scalable && self.pixel_format().is_some()
    }
}

impl fmt::Display for ModeCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.coding, self.width, self.height)?;
        if self.scalable {
            f.write_str(" (format7)")?;
        }
        Ok(())
    }
}

/// 模式选择回调
///
/// 协商期间只调用一次。返回的错误会被包装成
/// [`CameraError::Selection`](iidc_core::error::CameraError::Selection)，
/// 原始错误保留在 `source()` 中。
pub trait ModeSelector {
    fn select(&mut self, candidates: &[ModeCandidate]) -> Result<usize, BoxError>;
}

impl<F, E> ModeSelector for F
where
    F: FnMut(&[ModeCandidate]) -> Result<usize, E>,
    E: Into<BoxError>,
{
    fn select(&mut self, candidates: &[ModeCandidate]) -> Result<usize, BoxError> {
        self(candidates).map_err(Into::into)
    }
}

/// 帮助闭包推断参数类型
///
/// ```
/// use iidc::select;
///
/// let _selector = select::from_fn(|modes| {
///     modes
///         .iter()
///         .position(|m| m.width == 640)
///         .ok_or_else(|| "no VGA mode".into())
/// });
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&[ModeCandidate]) -> Result<usize, BoxError>,
{
    f
}

/// 总是选第一个候选
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

pub fn first() -> First {
    First
}

impl ModeSelector for First {
    fn select(&mut self, candidates: &[ModeCandidate]) -> Result<usize, BoxError> {
        if candidates.is_empty() {
            return Err("Device does not report any video mode".into());
        }
        Ok(0)
    }
}

/// 选择指定的 (格式, 宽, 高)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exact {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
}

pub fn exact(format: PixelFormat, width: u32, height: u32) -> Exact {
    Exact {
        format,
        width,
        height,
    }
}

impl ModeSelector for Exact {
    fn select(&mut self, candidates: &[ModeCandidate]) -> Result<usize, BoxError> {
        candidates
            .iter()
            .position(|m| {
                !m.scalable
                    && m.pixel_format() == Some(self.format)
                    && m.width == self.width
                    && m.height == self.height
            })
            .ok_or_else(|| {
                format!(
                    "Frame type {} {}x{} not supported by camera",
                    self.format, self.width, self.height
                )
                .into()
            })
    }
}

/// 默认偏好：RGB8 > YUV422 > Gray16 > Gray8，同一格式取面积最大者
///
/// Format7 和无法映射的编码会被跳过 (后者记一条警告)。
#[derive(Debug, Clone, Copy, Default)]
pub struct BestQuality;

pub fn best_quality() -> BestQuality {
    BestQuality
}

impl BestQuality {
    const PREFERENCE: [PixelFormat; 4] = [
        PixelFormat::Rgb8,
        PixelFormat::Yuv422,
        PixelFormat::Gray16,
        PixelFormat::Gray8,
    ];

    fn rank(format: PixelFormat) -> usize {
        Self::PREFERENCE
            .iter()
            .position(|p| *p == format)
            .unwrap_or(Self::PREFERENCE.len())
    }
}

impl ModeSelector for BestQuality {
    fn select(&mut self, candidates: &[ModeCandidate]) -> Result<usize, BoxError> {
        for m in candidates.iter().filter(|m| m.pixel_format().is_none()) {
            tracing::warn!(
                target: "iidc::select",
                "Unsupported video mode {:#010x} {}x{}",
                m.coding.raw(),
                m.width,
                m.height
            );
        }

        candidates
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_usable())
            .filter_map(|(i, m)| m.pixel_format().map(|f| (i, Self::rank(f), m.area())))
            // 排名越小越好；同排名面积越大越好
            .max_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)))
            .map(|(i, _, _)| i)
            .ok_or_else(|| "Device does not support a known video mode".into())
    }
}
