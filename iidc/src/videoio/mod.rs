pub mod backend;
pub mod negotiation;

use std::fmt;

use iidc_core::builder::{SessionConfig, CAPTURE_BUFFER_COUNT};
use iidc_core::error::{CameraError, LibError, LibResult, Result};
use iidc_core::feature::{Feature, FeatureMode, FeatureModes};
use iidc_core::frame::Frame;
use iidc_core::pixel_format::PixelFormat;
use iidc_core::traits::{BufferSlot, CameraDevice, CameraId, CapturePolicy};
use iidc_core::video::{ColorCoding, FrameRate, VideoMode};

use crate::bus::{Bus, CameraClaim};
use crate::select::ModeSelector;

pub use negotiation::StreamFormat;

/// 会话状态
///
/// `Uninitialized` 与 `Negotiating` 只在 [`CameraSession::open`] 内部出现，
/// 调用者拿到的会话总是 `Streaming` 或 `Closed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Negotiating,
    Streaming,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Negotiating => "negotiating",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// 打开的相机及其占用
///
/// 字段按释放顺序声明：Drop 先停止传输和采集，然后释放相机句柄，
/// 再解除占用、释放总线引用。开启失败时丢弃它就完成了回滚。
struct Attached {
    camera: Box<dyn CameraDevice>,
    claim: CameraClaim,
    capture_active: bool,
    transmitting: bool,
    /// 打开流程全部完成；只有完整打开过的相机在关闭时断电
    streaming: bool,
    /// 上一次 read 取出、尚未归还的缓冲区
    pending: Option<BufferSlot>,
}

impl Attached {
    fn step(result: LibResult<()>, operation: &str, id: CameraId) {
        if let Err(e) = result {
            tracing::warn!(target: "iidc::session", camera = %id, "{} failed during release: {}", operation, e);
        }
    }
}

impl Drop for Attached {
    fn drop(&mut self) {
        let id = self.claim.id();
        if !self.streaming {
            tracing::debug!(target: "iidc::session", camera = %id, "rolling back partially opened camera");
        }
        if let Some(slot) = self.pending.take() {
            Self::step(self.camera.capture_enqueue(slot), "dc1394_capture_enqueue", id);
        }
        if self.transmitting {
            Self::step(
                self.camera.set_transmission(false),
                "dc1394_video_set_transmission",
                id,
            );
        }
        if self.capture_active {
            Self::step(self.camera.capture_stop(), "dc1394_capture_stop", id);
        }
        if self.streaming {
            Self::step(self.camera.set_power(false), "dc1394_camera_set_power", id);
        }
    }
}

/// 一台相机的采集会话
///
/// ```no_run
/// use iidc::prelude::*;
///
/// let bus = Bus::new()?;
/// let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::best_quality())?;
/// let frame = cam.read()?;
/// println!("{}x{} {}", frame.width, frame.height, frame.format);
/// cam.close();
/// # Ok::<(), iidc::CameraError>(())
/// ```
pub struct CameraSession {
    attached: Option<Attached>,
    id: CameraId,
    node: u32,
    format: StreamFormat,
    sequence: u64,
}

impl CameraSession {
    /// 打开 `config.node` 号相机并协商视频模式
    ///
    /// 失败时已经执行过的步骤全部撤销，总线引用计数恢复原值。
    pub fn open<S: ModeSelector>(
        bus: &Bus,
        config: SessionConfig,
        mut selector: S,
    ) -> Result<Self> {
        let ctx = bus.get()?;
        let mut state = SessionState::Uninitialized;
        tracing::debug!(target: "iidc::session", node = config.node, %state, "opening camera");

        let id = negotiation::locate(&ctx, config.node)?;
        let claim = CameraClaim::acquire(ctx, id)?;
        let camera = claim.bus().open_camera(id)?;
        let mut attached = Attached {
            camera,
            claim,
            capture_active: false,
            transmitting: false,
            streaming: false,
            pending: None,
        };

        state = SessionState::Negotiating;
        tracing::debug!(target: "iidc::session", camera = %id, %state, "negotiating video mode");

        let (modes, candidates) = negotiation::candidates(&mut *attached.camera)?;
        let index = negotiation::choose(&candidates, &mut selector)?;
        let format = negotiation::apply(
            &mut *attached.camera,
            &config,
            modes[index],
            &candidates[index],
        )?;

        attached
            .camera
            .capture_setup(CAPTURE_BUFFER_COUNT)
            .map_err(CameraError::library("dc1394_capture_setup"))?;
        attached.capture_active = true;

        attached
            .camera
            .set_transmission(true)
            .map_err(CameraError::library("dc1394_video_set_transmission"))?;
        attached.transmitting = true;
        attached.streaming = true;

        state = SessionState::Streaming;
        tracing::info!(
            target: "iidc::session",
            camera = %id,
            %state,
            "{} {}x{} ({}) @ {}",
            format.mode,
            format.width,
            format.height,
            format.pixel_format,
            format.frame_rate
        );

        Ok(Self {
            attached: Some(attached),
            id,
            node: config.node,
            format,
            sequence: 0,
        })
    }

    /// 阻塞读取下一帧
    ///
    /// 上一帧的缓冲区在取新帧之前归还驱动，返回的 [`Frame`] 是独立的拷贝。
    pub fn read(&mut self) -> Result<Frame> {
        self.fetch(CapturePolicy::Wait)?.ok_or_else(|| {
            CameraError::Capture(LibError::failure("dc1394_capture_dequeue returned no frame"))
        })
    }

    /// 非阻塞读取；没有新帧时返回 `Ok(None)`
    pub fn try_read(&mut self) -> Result<Option<Frame>> {
        self.fetch(CapturePolicy::Poll)
    }

    fn fetch(&mut self, policy: CapturePolicy) -> Result<Option<Frame>> {
        let attached = self.attached.as_mut().ok_or(CameraError::Closed)?;

        if let Some(prev) = attached.pending.take() {
            attached
                .camera
                .capture_enqueue(prev)
                .map_err(CameraError::Capture)?;
        }

        let slot = match attached
            .camera
            .capture_dequeue(policy)
            .map_err(CameraError::Capture)?
        {
            Some(slot) => slot,
            None => return Ok(None),
        };
        if slot.frames_behind > 0 {
            tracing::trace!(target: "iidc::session", "{} frame(s) behind", slot.frames_behind);
        }

        let frame = Frame {
            data: attached.camera.buffer_data(&slot).to_vec(),
            width: slot.width,
            height: slot.height,
            stride: slot.stride,
            format: self.format.pixel_format,
            sequence: self.sequence,
            timestamp: slot.timestamp,
        };
        attached.pending = Some(slot);
        self.sequence += 1;
        Ok(Some(frame))
    }

    /// 停止采集并释放相机；可重复调用
    pub fn close(&mut self) {
        if let Some(attached) = self.attached.take() {
            drop(attached);
            tracing::info!(target: "iidc::session", camera = %self.id, "camera closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.attached.is_some()
    }

    /// 当前状态，只会是 `Streaming` 或 `Closed`
    ///
    /// 另外两个状态只在 [`CameraSession::open`] 的日志中出现。
    pub fn state(&self) -> SessionState {
        if self.is_open() {
            SessionState::Streaming
        } else {
            SessionState::Closed
        }
    }

    // --- 协商结果 (关闭后仍保留最后的值) ---

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format.pixel_format
    }

    pub fn color_coding(&self) -> ColorCoding {
        self.format.coding
    }

    pub fn video_mode(&self) -> VideoMode {
        self.format.mode
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.format.frame_rate
    }

    pub fn stream_format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn camera_id(&self) -> CameraId {
        self.id
    }

    pub fn node(&self) -> u32 {
        self.node
    }

    // --- Feature ---

    fn control<T>(
        &mut self,
        feature: Feature,
        op: impl FnOnce(&mut dyn CameraDevice) -> LibResult<T>,
    ) -> Result<T> {
        let attached = self.attached.as_mut().ok_or(CameraError::Closed)?;
        op(&mut *attached.camera).map_err(CameraError::feature(feature))
    }

    pub fn feature_value(&mut self, feature: Feature) -> Result<u32> {
        self.control(feature, |cam| cam.feature_value(feature))
    }

    pub fn set_feature_value(&mut self, feature: Feature, value: u32) -> Result<()> {
        tracing::debug!(target: "iidc::session", "{} = {}", feature, value);
        self.control(feature, |cam| cam.set_feature_value(feature, value))
    }

    pub fn feature_power(&mut self, feature: Feature) -> Result<bool> {
        self.control(feature, |cam| cam.feature_power(feature))
    }

    pub fn set_feature_power(&mut self, feature: Feature, on: bool) -> Result<()> {
        self.control(feature, |cam| cam.set_feature_power(feature, on))
    }

    pub fn feature_mode(&mut self, feature: Feature) -> Result<FeatureMode> {
        self.control(feature, |cam| cam.feature_mode(feature))
    }

    pub fn set_feature_mode(&mut self, feature: Feature, mode: FeatureMode) -> Result<()> {
        self.control(feature, |cam| cam.set_feature_mode(feature, mode))
    }

    /// 该 Feature 支持的控制模式
    pub fn feature_modes(&mut self, feature: Feature) -> Result<FeatureModes> {
        self.control(feature, |cam| cam.feature_modes(feature))
    }

    pub fn feature_present(&mut self, feature: Feature) -> Result<bool> {
        self.control(feature, |cam| cam.feature_is_present(feature))
    }

    pub fn feature_readable(&mut self, feature: Feature) -> Result<bool> {
        self.control(feature, |cam| cam.feature_is_readable(feature))
    }

    pub fn feature_switchable(&mut self, feature: Feature) -> Result<bool> {
        self.control(feature, |cam| cam.feature_is_switchable(feature))
    }

    /// (min, max)
    pub fn feature_bounds(&mut self, feature: Feature) -> Result<(u32, u32)> {
        self.control(feature, |cam| cam.feature_boundaries(feature))
    }

    pub fn feature_min(&mut self, feature: Feature) -> Result<u32> {
        Ok(self.feature_bounds(feature)?.0)
    }

    pub fn feature_max(&mut self, feature: Feature) -> Result<u32> {
        Ok(self.feature_bounds(feature)?.1)
    }

    /// 导出当前模式与全部可读 Feature 的值
    #[cfg(feature = "serialize")]
    pub fn export_state(&mut self) -> Result<serde_json::Value> {
        let mut features = serde_json::Map::new();
        for feature in Feature::ALL {
            if self.feature_present(feature)? && self.feature_readable(feature)? {
                let value = self.feature_value(feature)?;
                features.insert(feature.name().to_string(), value.into());
            }
        }
        Ok(serde_json::json!({
            "camera": self.id.to_string(),
            "node": self.node,
            "video_mode": self.format.mode.to_string(),
            "color_coding": self.format.coding.to_string(),
            "pixel_format": self.format.pixel_format.to_string(),
            "width": self.format.width,
            "height": self.format.height,
            "frame_rate": self.format.frame_rate.fps(),
            "features": features,
        }))
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("state", &self.state())
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl fmt::Display for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraSession({})", self.id)
    }
}
