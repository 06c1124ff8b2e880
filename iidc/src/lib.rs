//! IIDC (FireWire) 相机
//!
//! - [`Bus`]：总线句柄，枚举相机
//! - [`CameraSession`]：打开一台相机、协商视频模式、阻塞读帧、读写 Feature
//! - [`select`]：模式选择回调与常用策略
//!
//! 默认不带任何硬件后端；开启 `libdc1394` feature 使用系统的 libdc1394，
//! 或者通过 [`Bus::with_driver`] 接入其它驱动 (例如仿真总线)。

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod bus;
pub mod select;
pub mod videoio;

pub use bus::{Bus, BusContextHandle};
pub use iidc_core::error::{CameraError, Result};
pub use videoio::{CameraSession, SessionState, StreamFormat};

#[cfg(feature = "simulation")]
pub use iidc_simulation as simulation;

/// 预置模块，用户可以通过 `use iidc::prelude::*;` 导入常用项
pub mod prelude {
    pub use crate::bus::Bus;
    pub use crate::select::{self, ModeCandidate, ModeSelector};
    pub use crate::videoio::{CameraSession, SessionState};
    pub use iidc_core::prelude::*;
}
