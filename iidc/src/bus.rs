use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use iidc_core::builder::SessionConfig;
use iidc_core::error::{CameraError, Result};
use iidc_core::traits::{BusContext, CameraDevice, CameraId, CameraInfo, Driver};

use crate::select::ModeSelector;
use crate::videoio::{backend, CameraSession};

/// 共享的总线上下文
///
/// 由 [`Bus`] 和它创建的每个 [`CameraSession`] 共同持有 (`Arc`)，
/// 最后一个持有者释放时才调用 dc1394_free。
pub struct BusContextHandle {
    context: Box<dyn BusContext>,
    backend: &'static str,
    /// 已被会话占用的相机，同一台相机只能有一个采集者
    claimed: Mutex<HashSet<CameraId>>,
}

impl BusContextHandle {
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// 枚举相机
    ///
    /// 枚举调用本身出错时为 [`CameraError::NoCamera`]；总线上一台相机都没有时为
    /// [`CameraError::NoCameraFound`]。
    pub fn enumerate(&self) -> Result<Vec<CameraId>> {
        let ids = self.context.enumerate().map_err(CameraError::NoCamera)?;
        if ids.is_empty() {
            return Err(CameraError::NoCameraFound);
        }
        Ok(ids)
    }

    pub(crate) fn open_camera(&self, id: CameraId) -> Result<Box<dyn CameraDevice>> {
        self.context
            .open_camera(id)
            .map_err(CameraError::library("dc1394_camera_new"))
    }

    /// 占用一台相机；已被占用时快速失败
    fn claim(&self, id: CameraId) -> Result<()> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        if !claimed.insert(id) {
            return Err(CameraError::DeviceBusy { guid: id.guid });
        }
        Ok(())
    }

    fn release(&self, id: CameraId) {
        let mut claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        claimed.remove(&id);
    }

    pub fn is_claimed(&self, id: CameraId) -> bool {
        let claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        claimed.contains(&id)
    }
}

impl fmt::Debug for BusContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusContextHandle")
            .field("backend", &self.backend)
            .field("claimed", &self.claimed)
            .finish()
    }
}

/// 会话对一台相机的占用，同时持有一份总线上下文引用
///
/// Drop 时先解除占用，再释放上下文引用。
#[derive(Debug)]
pub(crate) struct CameraClaim {
    bus: Arc<BusContextHandle>,
    id: CameraId,
}

impl CameraClaim {
    pub(crate) fn acquire(bus: Arc<BusContextHandle>, id: CameraId) -> Result<Self> {
        bus.claim(id)?;
        Ok(Self { bus, id })
    }

    pub(crate) fn bus(&self) -> &BusContextHandle {
        &self.bus
    }

    pub(crate) fn id(&self) -> CameraId {
        self.id
    }
}

impl Drop for CameraClaim {
    fn drop(&mut self) {
        self.bus.release(self.id);
    }
}

/// 总线句柄 (对应 libdc1394 的 dc1394_t)
///
/// ```no_run
/// use iidc::prelude::*;
///
/// let mut bus = Bus::new()?;
/// for cam in bus.list_cameras()? {
///     println!("{}: {}", cam.node, cam.id);
/// }
/// bus.close();
/// # Ok::<(), iidc::CameraError>(())
/// ```
#[derive(Debug)]
pub struct Bus {
    inner: Option<Arc<BusContextHandle>>,
}

impl Bus {
    /// 使用编译时选定的默认后端打开总线
    pub fn new() -> Result<Self> {
        Self::with_driver(backend::create_driver()?)
    }

    /// 使用指定的驱动打开总线
    pub fn with_driver(driver: Arc<dyn Driver>) -> Result<Self> {
        let context = driver.new_context()?;
        tracing::debug!(target: "iidc::bus", backend = driver.name(), "bus context acquired");
        Ok(Self {
            inner: Some(Arc::new(BusContextHandle {
                context,
                backend: driver.name(),
                claimed: Mutex::new(HashSet::new()),
            })),
        })
    }

    /// 释放本句柄持有的引用；可重复调用
    ///
    /// 仍在运行的会话会让底层上下文继续存活，直到它们关闭。
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!(target: "iidc::bus", "bus handle closed");
        }
    }

    /// 获取存活的上下文
    pub fn get(&self) -> Result<Arc<BusContextHandle>> {
        self.inner.clone().ok_or(CameraError::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// 当前持有上下文的引用数 (本句柄 + 存活的会话)；关闭后为 0
    pub fn ref_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// 后端名称 (e.g. "libdc1394")
    pub fn driver_name(&self) -> Result<&'static str> {
        Ok(self.inner.as_ref().ok_or(CameraError::Closed)?.backend)
    }

    /// 列出总线上的相机
    pub fn list_cameras(&self) -> Result<Vec<CameraInfo>> {
        let ctx = self.get()?;
        let ids = ctx.enumerate()?;
        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(node, id)| CameraInfo {
                node: node as u32,
                id,
                backend: ctx.backend.to_string(),
            })
            .collect())
    }

    /// 等价于 [`CameraSession::open`]
    pub fn open_camera<S: ModeSelector>(
        &self,
        config: SessionConfig,
        selector: S,
    ) -> Result<CameraSession> {
        CameraSession::open(self, config, selector)
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(ctx) => write!(f, "Bus({})", ctx.backend),
            None => f.write_str("Bus(closed)"),
        }
    }
}
