use iidc_core::error::{LibError, LibResult};
use iidc_core::feature::{FeatureMode, FeatureModes};
use iidc_core::video::{ColorCoding, FrameRate, VideoMode};
use libdc1394_sys as ffi;
use std::ffi::CStr;

/// 把 libdc1394 的错误码翻译为带原文描述的 [`LibError`]
pub fn lib_error(code: ffi::dc1394error_t::Type) -> LibError {
    // dc1394_error_get_string 返回静态字符串表中的指针
    let ptr = unsafe { ffi::dc1394_error_get_string(code) };
    let message = if ptr.is_null() {
        format!("libdc1394 error {}", code)
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    };
    LibError::new(code as i32, message)
}

/// 检查 libdc1394 调用的返回值
macro_rules! dc1394_try {
    ($call:expr) => {{
        tracing::trace!(target: "iidc::dc1394", "{}", stringify!($call));
        match unsafe { $call } {
            libdc1394_sys::dc1394error_t::DC1394_SUCCESS => {}
            code => return Err($crate::pixel_map::lib_error(code)),
        }
    }};
}
pub(crate) use dc1394_try;

pub fn switch(on: bool) -> ffi::dc1394switch_t::Type {
    if on {
        ffi::dc1394switch_t::DC1394_ON
    } else {
        ffi::dc1394switch_t::DC1394_OFF
    }
}

pub fn is_true(value: ffi::dc1394bool_t::Type) -> bool {
    value == ffi::dc1394bool_t::DC1394_TRUE
}

pub fn from_ffi_mode(raw: ffi::dc1394video_mode_t::Type) -> LibResult<VideoMode> {
    VideoMode::from_raw(raw as u32)
        .ok_or_else(|| LibError::failure(format!("Unknown video mode {}", raw)))
}

pub fn from_ffi_coding(raw: ffi::dc1394color_coding_t::Type) -> LibResult<ColorCoding> {
    ColorCoding::from_raw(raw as u32)
        .ok_or_else(|| LibError::failure(format!("Unknown color coding {}", raw)))
}

pub fn from_ffi_frame_rate(raw: ffi::dc1394framerate_t::Type) -> LibResult<FrameRate> {
    FrameRate::from_raw(raw as u32)
        .ok_or_else(|| LibError::failure(format!("Unknown frame rate {}", raw)))
}

pub fn from_ffi_feature_mode(raw: ffi::dc1394feature_mode_t::Type) -> LibResult<FeatureMode> {
    FeatureMode::from_raw(raw as u32)
        .ok_or_else(|| LibError::failure(format!("Unknown feature mode {}", raw)))
}

pub fn from_ffi_feature_modes(raw: &ffi::dc1394feature_modes_t) -> FeatureModes {
    raw.modes[..raw.num as usize]
        .iter()
        .filter_map(|m| FeatureMode::from_raw(*m as u32))
        .collect()
}
