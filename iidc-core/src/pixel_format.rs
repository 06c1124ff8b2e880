use crate::error::CameraError;
use crate::video::ColorCoding;
use std::fmt::{self, Display};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// 四字符代码 (Four Character Code)，视频工业标准
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FourCC(pub u32);

impl FourCC {
    /// 从 ASCII 字符创建 FourCC
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self((a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24))
    }

    /// 8-bit 灰度
    pub const GREY: Self = Self::new(b'G', b'R', b'E', b'Y');
    /// 16-bit 灰度
    pub const Y16: Self = Self::new(b'Y', b'1', b'6', b' ');
    /// UYVY 4:2:2 (IIDC 的 YUV422 字节序)
    pub const UYVY: Self = Self::new(b'U', b'Y', b'V', b'Y');
    /// RGB24 (R-G-B)
    pub const RGB3: Self = Self::new(b'R', b'G', b'B', b'3');
}

impl Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_le_bytes();

        write!(f, "{}", String::from_utf8_lossy(&bytes))
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

/// 会话输出帧的像素格式标签
///
/// 只有这四种编码有映射，其他 IIDC 编码 (YUV411, RAW8, ...) 的转换不在本库范围内。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum PixelFormat {
    Gray8,
    /// packed UYVY 4:2:2
    Yuv422,
    /// packed RGB 8-bit
    Rgb8,
    /// 16-bit 灰度，IIDC 规定为大端字节序
    Gray16,
}

impl PixelFormat {
    pub const fn fourcc(self) -> FourCC {
        match self {
            Self::Gray8 => FourCC::GREY,
            Self::Yuv422 => FourCC::UYVY,
            Self::Rgb8 => FourCC::RGB3,
            Self::Gray16 => FourCC::Y16,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Yuv422 | Self::Gray16 => 2,
            Self::Rgb8 => 3,
        }
    }

    /// 紧密排列时一行的字节数
    pub const fn min_stride(self, width: u32) -> usize {
        width as usize * self.bytes_per_pixel()
    }

    pub const fn color_coding(self) -> ColorCoding {
        match self {
            Self::Gray8 => ColorCoding::Mono8,
            Self::Yuv422 => ColorCoding::Yuv422,
            Self::Rgb8 => ColorCoding::Rgb8,
            Self::Gray16 => ColorCoding::Mono16,
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gray8 => "gray8",
            Self::Yuv422 => "yuv422",
            Self::Rgb8 => "rgb8",
            Self::Gray16 => "gray16",
        };
        f.write_str(name)
    }
}

impl TryFrom<ColorCoding> for PixelFormat {
    type Error = CameraError;

    fn try_from(coding: ColorCoding) -> Result<Self, Self::Error> {
        match coding {
            ColorCoding::Mono8 => Ok(Self::Gray8),
            ColorCoding::Yuv422 => Ok(Self::Yuv422),
            ColorCoding::Rgb8 => Ok(Self::Rgb8),
            ColorCoding::Mono16 => Ok(Self::Gray16),
            other => Err(CameraError::UnsupportedFormat(other)),
        }
    }
}

impl PartialEq<PixelFormat> for FourCC {
    fn eq(&self, other: &PixelFormat) -> bool {
        *self == other.fourcc()
    }
}

impl PartialEq<FourCC> for PixelFormat {
    fn eq(&self, other: &FourCC) -> bool {
        self.fourcc() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_codings() {
        assert_eq!(PixelFormat::try_from(ColorCoding::Mono8).unwrap(), PixelFormat::Gray8);
        assert_eq!(PixelFormat::try_from(ColorCoding::Yuv422).unwrap(), PixelFormat::Yuv422);
        assert_eq!(PixelFormat::try_from(ColorCoding::Rgb8).unwrap(), PixelFormat::Rgb8);
        assert_eq!(PixelFormat::try_from(ColorCoding::Mono16).unwrap(), PixelFormat::Gray16);
    }

    #[test]
    fn unmapped_coding_is_hard_error() {
        for coding in [ColorCoding::Yuv411, ColorCoding::Raw8, ColorCoding::Rgb16] {
            match PixelFormat::try_from(coding) {
                Err(CameraError::UnsupportedFormat(c)) => assert_eq!(c, coding),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn fourcc_display() {
        assert_eq!(PixelFormat::Yuv422.fourcc().to_string(), "UYVY");
        assert_eq!(FourCC::GREY, PixelFormat::Gray8);
        assert_eq!(PixelFormat::Rgb8.min_stride(640), 1920);
    }
}
