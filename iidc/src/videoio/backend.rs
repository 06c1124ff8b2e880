use std::sync::Arc;

use iidc_core::error::{CameraError, Result};
use iidc_core::traits::Driver;

/// 创建编译时选定的默认驱动
#[allow(unreachable_code)]
pub fn create_driver() -> Result<Arc<dyn Driver>> {
    #[cfg(feature = "libdc1394")]
    {
        return Ok(iidc_backend_dc1394::default_driver());
    }

    // 如果没有匹配的后端，返回错误
    Err(CameraError::Init(
        "No supported backend found. Please enable the \"libdc1394\" Cargo feature.".into(),
    ))
}
