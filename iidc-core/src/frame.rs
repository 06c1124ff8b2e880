use crate::error::{CameraError, Result};
use crate::pixel_format::PixelFormat;
use std::fmt;
use std::time::Duration;

/// 一帧图像
///
/// 数据从驱动的 DMA 环形缓冲区拷贝而来，所有权完全属于调用者，
/// 与底层缓冲区之间不存在别名。
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// 原始图像数据
    pub data: Vec<u8>,

    /// 图像宽度 (Pixels)
    pub width: u32,

    /// 图像高度 (Pixels)
    pub height: u32,

    /// 跨距 (Bytes per line)
    pub stride: usize,

    /// 像素格式
    pub format: PixelFormat,

    /// 会话内的帧序号，从 0 开始
    pub sequence: u64,

    /// 驱动给出的帧时间戳 (1394 总线时间, 微秒)
    pub timestamp: Duration,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// 获取某一行的像素数据 (不含行尾 Padding)
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let end = start + self.format.min_stride(self.width);
        self.data.get(start..end)
    }

    /// 将 Gray16 帧解码为本机字节序的采样值
    ///
    /// IIDC 的 MONO16 是大端存储。
    pub fn to_gray16(&self) -> Result<Vec<u16>> {
        if self.format != PixelFormat::Gray16 {
            return Err(CameraError::FormatMismatch {
                format: self.format,
                requested: "gray16",
            });
        }
        let mut samples = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            if let Some(row) = self.row(y) {
                samples.extend(
                    row.chunks_exact(2)
                        .map(|px| u16::from_be_bytes([px[0], px[1]])),
                );
            }
        }
        Ok(samples)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("stride", &self.stride)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(format: PixelFormat, width: u32, height: u32, stride: usize) -> Frame {
        Frame {
            data: (0..stride * height as usize).map(|i| i as u8).collect(),
            width,
            height,
            stride,
            format,
            sequence: 0,
            timestamp: Duration::ZERO,
        }
    }

    #[test]
    fn rows_skip_padding() {
        let f = frame(PixelFormat::Gray8, 3, 2, 4);
        assert_eq!(f.row(0), Some(&[0u8, 1, 2][..]));
        assert_eq!(f.row(1), Some(&[4u8, 5, 6][..]));
        assert_eq!(f.row(2), None);
    }

    #[test]
    fn gray16_is_big_endian() {
        let f = frame(PixelFormat::Gray16, 2, 1, 4);
        assert_eq!(f.to_gray16().unwrap(), vec![0x0001, 0x0203]);
    }

    #[test]
    fn gray16_view_rejects_other_formats() {
        let f = frame(PixelFormat::Rgb8, 1, 1, 3);
        assert!(matches!(
            f.to_gray16(),
            Err(CameraError::FormatMismatch { requested: "gray16", .. })
        ));
    }
}
