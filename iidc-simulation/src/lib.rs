//! 仿真 IIDC 总线
//!
//! 在没有 FireWire 硬件的机器上驱动完整的会话流程：相机、视频模式、帧率和
//! Feature 全部由脚本描述，每一次后端调用都会记入日志 (journal)，
//! 并且可以让任意一个调用按名字注入失败。
//!
//! ```
//! use iidc_core::video::{FrameRate, VideoMode};
//! use iidc_simulation::{SimCamera, SimulatedBus};
//!
//! let bus = SimulatedBus::new().with_camera(
//!     SimCamera::new(0x0814_4360_0000_0001)
//!         .mode(VideoMode::Mode640x480Mono8, &[FrameRate::F15, FrameRate::F30]),
//! );
//! let driver = bus.driver();
//! assert_eq!(driver.name(), "simulation");
//! ```

pub mod camera;
mod device;

pub use camera::{SimCamera, SimFeature, SimMode};
pub use device::SimDevice;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use iidc_core::error::{CameraError, LibError, LibResult, Result};
use iidc_core::feature::Feature;
use iidc_core::traits::{BusContext, CameraDevice, CameraId, Driver};
use iidc_core::video::{FrameRate, IsoSpeed, VideoMode};

/// 一次后端调用，名字与 libdc1394 函数一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    New,
    Free,
    Enumerate,
    CameraNew(CameraId),
    CameraFree(CameraId),
    SupportedModes,
    ColorCoding(VideoMode),
    ImageSize(VideoMode),
    SetIsoSpeed(IsoSpeed),
    SetVideoMode(VideoMode),
    SupportedFrameRates(VideoMode),
    SetFrameRate(FrameRate),
    CaptureSetup(u32),
    CaptureStop,
    SetTransmission(bool),
    SetPower(bool),
    Dequeue(usize),
    Enqueue(usize),
    FeatureGet(Feature),
    FeatureSet(Feature),
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "dc1394_new",
            Self::Free => "dc1394_free",
            Self::Enumerate => "dc1394_camera_enumerate",
            Self::CameraNew(_) => "dc1394_camera_new",
            Self::CameraFree(_) => "dc1394_camera_free",
            Self::SupportedModes => "dc1394_video_get_supported_modes",
            Self::ColorCoding(_) => "dc1394_get_color_coding_from_video_mode",
            Self::ImageSize(_) => "dc1394_get_image_size_from_video_mode",
            Self::SetIsoSpeed(_) => "dc1394_video_set_iso_speed",
            Self::SetVideoMode(_) => "dc1394_video_set_mode",
            Self::SupportedFrameRates(_) => "dc1394_video_get_supported_framerates",
            Self::SetFrameRate(_) => "dc1394_video_set_framerate",
            Self::CaptureSetup(_) => "dc1394_capture_setup",
            Self::CaptureStop => "dc1394_capture_stop",
            Self::SetTransmission(_) => "dc1394_video_set_transmission",
            Self::SetPower(_) => "dc1394_camera_set_power",
            Self::Dequeue(_) => "dc1394_capture_dequeue",
            Self::Enqueue(_) => "dc1394_capture_enqueue",
            Self::FeatureGet(_) => "dc1394_feature_get",
            Self::FeatureSet(_) => "dc1394_feature_set",
        }
    }

    /// 是否属于硬件配置调用 (改变相机状态的调用)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::SetIsoSpeed(_)
                | Self::SetVideoMode(_)
                | Self::SetFrameRate(_)
                | Self::CaptureSetup(_)
                | Self::SetTransmission(true)
        )
    }
}

#[derive(Debug, Default)]
struct SimState {
    cameras: Vec<SimCamera>,
    journal: Vec<Op>,
    failures: HashMap<&'static str, LibError>,
    init_failure: Option<String>,
    live_contexts: usize,
    live_cameras: usize,
    /// 剩余可出队的帧数，`None` 为无限
    frame_budget: Option<u64>,
}

pub(crate) type Shared = Arc<Mutex<SimState>>;

pub(crate) fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    // 仿真状态不会在 panic 中途被留在不一致的状态，直接取回
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 记录调用并检查是否注入了失败
pub(crate) fn record(state: &Shared, op: Op) -> LibResult<()> {
    let mut s = lock(state);
    s.journal.push(op);
    tracing::trace!(target: "iidc::simulation", "{:?}", op);
    match s.failures.get(op.name()) {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// 脚本化的仿真总线
///
/// 克隆共享同一份状态，测试可以在会话运行时查看日志。
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    state: Shared,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(self, camera: SimCamera) -> Self {
        lock(&self.state).cameras.push(camera);
        self
    }

    /// 让名为 `op` 的 libdc1394 调用返回 `error`
    pub fn fail_on(self, op: &'static str, error: LibError) -> Self {
        lock(&self.state).failures.insert(op, error);
        self
    }

    /// 让 dc1394_new 失败
    pub fn fail_init(self, message: impl Into<String>) -> Self {
        lock(&self.state).init_failure = Some(message.into());
        self
    }

    /// 限制总共能出队的帧数
    pub fn frame_budget(self, frames: u64) -> Self {
        lock(&self.state).frame_budget = Some(frames);
        self
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failures.clear();
    }

    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(SimulatedDriver {
            state: self.state.clone(),
        })
    }

    /// 到目前为止的全部调用
    pub fn journal(&self) -> Vec<Op> {
        lock(&self.state).journal.clone()
    }

    pub fn clear_journal(&self) {
        lock(&self.state).journal.clear();
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        lock(&self.state).journal.iter().filter(|op| pred(op)).count()
    }

    /// 尚未 dc1394_free 的上下文数量
    pub fn live_contexts(&self) -> usize {
        lock(&self.state).live_contexts
    }

    /// 尚未 dc1394_camera_free 的相机数量
    pub fn live_cameras(&self) -> usize {
        lock(&self.state).live_cameras
    }
}

/// [`SimulatedBus`] 的驱动入口
#[derive(Debug)]
pub struct SimulatedDriver {
    state: Shared,
}

impl Driver for SimulatedDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn new_context(&self) -> Result<Box<dyn BusContext>> {
        let mut s = lock(&self.state);
        s.journal.push(Op::New);
        if let Some(msg) = &s.init_failure {
            return Err(CameraError::Init(msg.clone()));
        }
        s.live_contexts += 1;
        Ok(Box::new(SimContext {
            state: self.state.clone(),
        }))
    }
}

#[derive(Debug)]
struct SimContext {
    state: Shared,
}

impl BusContext for SimContext {
    fn enumerate(&self) -> LibResult<Vec<CameraId>> {
        record(&self.state, Op::Enumerate)?;
        Ok(lock(&self.state).cameras.iter().map(|c| c.id).collect())
    }

    fn open_camera(&self, id: CameraId) -> LibResult<Box<dyn CameraDevice>> {
        record(&self.state, Op::CameraNew(id))?;
        let mut s = lock(&self.state);
        let camera = s
            .cameras
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| LibError::new(-2, "Not a camera"))?;
        s.live_cameras += 1;
        drop(s);
        Ok(Box::new(SimDevice::new(self.state.clone(), camera)))
    }
}

impl Drop for SimContext {
    fn drop(&mut self) {
        let mut s = lock(&self.state);
        s.journal.push(Op::Free);
        s.live_contexts -= 1;
    }
}
