// 开启一些 Clippy 检查，保证代码质量
#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

// 模块定义
pub mod builder;
pub mod error;
pub mod feature;
pub mod frame;
pub mod pixel_format;
pub mod traits;
pub mod video;

// 方便用户使用的 Prelude
pub mod prelude {
    pub use crate::builder::{SessionConfig, CAPTURE_BUFFER_COUNT};
    pub use crate::error::{CameraError, LibError, Result};
    pub use crate::feature::{Feature, FeatureMode, FeatureModes};
    pub use crate::frame::Frame;
    pub use crate::pixel_format::PixelFormat;
    pub use crate::traits::{BusContext, CameraDevice, CameraId, CameraInfo, Driver};
    pub use crate::video::{ColorCoding, FrameRate, IsoSpeed, VideoMode};
}

// 版本与构建信息常量
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
