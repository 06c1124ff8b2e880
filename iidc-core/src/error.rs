use crate::feature::Feature;
use crate::pixel_format::PixelFormat;
use crate::video::ColorCoding;
use std::fmt;
use thiserror::Error;

/// 选择回调 (ModeSelector) 等外部代码返回的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 底层库 (libdc1394) 返回的错误
///
/// `code` 是库定义的错误码，`message` 是 `dc1394_error_get_string` 给出的原文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibError {
    pub code: i32,
    pub message: String,
}

impl LibError {
    /// libdc1394 的通用失败码 DC1394_FAILURE
    pub const FAILURE: i32 = -1;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Self::FAILURE, message)
    }
}

impl fmt::Display for LibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LibError {}

/// 后端调用的返回值
pub type LibResult<T> = std::result::Result<T, LibError>;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Error initialising DC1394 library: {0}")]
    Init(String),

    #[error("DC1394 device is closed. Did you call \"close\" before?")]
    Closed,

    #[error("Failed to enumerate cameras: {0}")]
    NoCamera(#[source] LibError),

    #[error(
        "Could not find a single digital camera on the firewire bus. Please check, whether the \
         kernel modules 'ieee1394', 'raw1394' and 'ohci1394' (or 'firewire-ohci') are loaded and \
         whether you have read/write permission on \"/dev/raw1394\" (or \"/dev/fw*\"). Also make \
         sure that the camera is connected and powered up."
    )]
    NoCameraFound,

    #[error("Camera node {index} out of range (found {count} camera(s))")]
    Index { index: u32, count: usize },

    #[error("Device busy: camera {guid:#018x} is already opened by another session")]
    DeviceBusy { guid: u64 },

    #[error("Scalable video mode {width}x{height} ({coding}) is not supported (format7)")]
    UnsupportedMode {
        coding: ColorCoding,
        width: u32,
        height: u32,
    },

    #[error("Unsupported color coding {0}: no pixel format mapping")]
    UnsupportedFormat(ColorCoding),

    #[error("Error during selection of camera resolution: {reason}")]
    Selection {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Invalid camera configuration: {0}")]
    Config(String),

    #[error("Failed to capture frame: {0}")]
    Capture(#[source] LibError),

    #[error("Feature {feature} failed: {source}")]
    Feature {
        feature: Feature,
        #[source]
        source: LibError,
    },

    #[error("{operation} failed: {source}")]
    Library {
        operation: &'static str,
        #[source]
        source: LibError,
    },

    #[error("Frame format {format} cannot be viewed as {requested}")]
    FormatMismatch {
        format: PixelFormat,
        requested: &'static str,
    },

    #[cfg(feature = "serialize")]
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CameraError {
    /// 将某个配置步骤的库错误包装为 [`CameraError::Library`]
    pub fn library(operation: &'static str) -> impl FnOnce(LibError) -> Self {
        move |source| Self::Library { operation, source }
    }

    /// 将 Feature 调用的库错误包装为 [`CameraError::Feature`]
    pub fn feature(feature: Feature) -> impl FnOnce(LibError) -> Self {
        move |source| Self::Feature { feature, source }
    }

    pub fn selection(reason: impl Into<String>) -> Self {
        Self::Selection {
            reason: reason.into(),
            source: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CameraError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn library_message_is_carried_verbatim() {
        let err = CameraError::library("dc1394_video_set_mode")(LibError::new(
            -7,
            "Invalid video mode",
        ));
        assert_eq!(err.to_string(), "dc1394_video_set_mode failed: Invalid video mode");
        assert_eq!(err.source().map(|s| s.to_string()), Some("Invalid video mode".into()));
    }

    #[test]
    fn no_camera_found_mentions_drivers_and_permissions() {
        let msg = CameraError::NoCameraFound.to_string();
        assert!(msg.contains("kernel modules"));
        assert!(msg.contains("permission"));
    }

    #[test]
    fn selection_keeps_original_cause() {
        let cause: BoxError = "user aborted".into();
        let err = CameraError::Selection {
            reason: cause.to_string(),
            source: Some(cause),
        };
        assert!(err.to_string().ends_with("user aborted"));
        assert_eq!(err.source().unwrap().to_string(), "user aborted");
    }
}
