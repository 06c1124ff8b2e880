//! 视频模式协商
//!
//! 步骤顺序与硬件要求一致：先枚举候选，再交给选择器，最后按
//! 速率 → 模式 → 帧率 的顺序写入相机。任何一步失败都直接返回错误，
//! 回滚由调用方 (会话) 负责。

use iidc_core::builder::SessionConfig;
use iidc_core::error::{CameraError, Result};
use iidc_core::pixel_format::PixelFormat;
use iidc_core::traits::{CameraDevice, CameraId};
use iidc_core::video::{ColorCoding, FrameRate, VideoMode};

use crate::bus::BusContextHandle;
use crate::select::{ModeCandidate, ModeSelector};

/// 协商结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub mode: VideoMode,
    pub coding: ColorCoding,
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

/// 找到 `node` 号相机的 GUID
pub(crate) fn locate(bus: &BusContextHandle, node: u32) -> Result<CameraId> {
    let ids = bus.enumerate()?;
    tracing::debug!(target: "iidc::negotiation", "found {} camera(s)", ids.len());
    ids.get(node as usize).copied().ok_or(CameraError::Index {
        index: node,
        count: ids.len(),
    })
}

/// 相机支持的全部模式，以及对应的候选描述 (两个列表按下标对齐)
///
/// Format7 与 EXIF 模式查询失败时只记一条警告并跳过，不影响固定模式。
pub(crate) fn candidates(
    camera: &mut dyn CameraDevice,
) -> Result<(Vec<VideoMode>, Vec<ModeCandidate>)> {
    let supported = camera
        .supported_modes()
        .map_err(CameraError::library("dc1394_video_get_supported_modes"))?;

    let mut modes = Vec::with_capacity(supported.len());
    let mut list = Vec::with_capacity(supported.len());
    for mode in supported {
        let scalable = camera.is_scalable(mode);
        let candidate = describe(camera, mode, scalable);
        let candidate = match candidate {
            Ok(c) => c,
            Err(e) if scalable || mode.nominal().is_none() => {
                tracing::warn!(target: "iidc::negotiation", "skipping video mode {}: {}", mode, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        modes.push(mode);
        list.push(candidate);
    }
    Ok((modes, list))
}

fn describe(camera: &mut dyn CameraDevice, mode: VideoMode, scalable: bool) -> Result<ModeCandidate> {
    let coding = camera
        .color_coding(mode)
        .map_err(CameraError::library("dc1394_get_color_coding_from_video_mode"))?;
    let (width, height) = camera
        .image_size(mode)
        .map_err(CameraError::library("dc1394_get_image_size_from_video_mode"))?;
    Ok(ModeCandidate {
        coding,
        width,
        height,
        scalable,
    })
}

/// 调用选择器并检查结果
pub(crate) fn choose<S: ModeSelector + ?Sized>(
    candidates: &[ModeCandidate],
    selector: &mut S,
) -> Result<usize> {
    let index = selector
        .select(candidates)
        .map_err(|source| CameraError::Selection {
            reason: source.to_string(),
            source: Some(source),
        })?;
    if index >= candidates.len() {
        return Err(CameraError::selection(format!(
            "selector returned index {} but only {} mode(s) are available",
            index,
            candidates.len()
        )));
    }
    Ok(index)
}

/// 把选中的模式写入相机，返回最终格式
///
/// Format7 与无法映射的编码在任何配置调用之前就被拒绝。
pub(crate) fn apply(
    camera: &mut dyn CameraDevice,
    config: &SessionConfig,
    mode: VideoMode,
    candidate: &ModeCandidate,
) -> Result<StreamFormat> {
    if candidate.scalable {
        return Err(CameraError::UnsupportedMode {
            coding: candidate.coding,
            width: candidate.width,
            height: candidate.height,
        });
    }
    let pixel_format = PixelFormat::try_from(candidate.coding)?;

    tracing::debug!(target: "iidc::negotiation", "iso speed {}", config.speed);
    camera
        .set_iso_speed(config.speed)
        .map_err(CameraError::library("dc1394_video_set_iso_speed"))?;

    tracing::debug!(target: "iidc::negotiation", "video mode {}", mode);
    camera
        .set_video_mode(mode)
        .map_err(CameraError::library("dc1394_video_set_mode"))?;

    let frame_rate = match config.frame_rate {
        Some(rate) => rate,
        None => highest_frame_rate(camera, mode)?,
    };
    tracing::debug!(target: "iidc::negotiation", "frame rate {}", frame_rate);
    camera
        .set_frame_rate(frame_rate)
        .map_err(CameraError::library("dc1394_video_set_framerate"))?;

    Ok(StreamFormat {
        mode,
        coding: candidate.coding,
        pixel_format,
        width: candidate.width,
        height: candidate.height,
        frame_rate,
    })
}

fn highest_frame_rate(camera: &mut dyn CameraDevice, mode: VideoMode) -> Result<FrameRate> {
    let rates = camera
        .supported_frame_rates(mode)
        .map_err(CameraError::library("dc1394_video_get_supported_framerates"))?;
    rates.into_iter().max().ok_or_else(|| {
        CameraError::Config(format!("video mode {} reports no supported frame rate", mode))
    })
}
