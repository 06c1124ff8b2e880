//! libdc1394 后端
//!
//! 所有实现都在 `libdc1394` feature 之后；不开启时 crate 只导出
//! [`BACKEND_NAME`]，方便上层在没有安装 libdc1394 的机器上编译。

#[cfg(feature = "libdc1394")]
pub mod controls;
#[cfg(feature = "libdc1394")]
pub mod device;
#[cfg(feature = "libdc1394")]
pub mod pixel_map;
#[cfg(feature = "libdc1394")]
pub mod stream;

/// 后端类型标识
pub const BACKEND_NAME: &str = "libdc1394";

#[cfg(feature = "libdc1394")]
pub use driver::{default_driver, Dc1394Driver};

#[cfg(feature = "libdc1394")]
mod driver {
    use iidc_core::error::{CameraError, Result};
    use iidc_core::traits::{BusContext, Driver};
    use std::sync::Arc;

    use crate::device::Dc1394Context;

    /// libdc1394 驱动
    /// 无状态，每次 `new_context` 对应一次 dc1394_new
    #[derive(Debug, Clone, Default)]
    pub struct Dc1394Driver;

    impl Dc1394Driver {
        pub fn new() -> Self {
            Self
        }
    }

    impl Driver for Dc1394Driver {
        fn name(&self) -> &'static str {
            crate::BACKEND_NAME
        }

        fn new_context(&self) -> Result<Box<dyn BusContext>> {
            let ctx = Dc1394Context::new().ok_or_else(|| {
                CameraError::Init("dc1394_new returned NULL (no FireWire driver present?)".into())
            })?;
            Ok(Box::new(ctx))
        }
    }

    // 为了方便直接使用，提供一个默认实例
    pub fn default_driver() -> Arc<dyn Driver> {
        Arc::new(Dc1394Driver::new())
    }
}
