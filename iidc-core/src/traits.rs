use crate::error::{LibResult, Result};
use crate::feature::{Feature, FeatureMode, FeatureModes};
use crate::video::{ColorCoding, FrameRate, IsoSpeed, VideoMode};
use std::fmt;
use std::time::Duration;

/// 相机的稳定硬件标识 (dc1394camera_id_t)
///
/// 枚举顺序 (node) 可能变化，打开相机时只使用 GUID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId {
    /// IEEE-1394 EUI-64
    pub guid: u64,
    /// 多单元设备的单元号
    pub unit: u16,
}

impl CameraId {
    pub const fn new(guid: u64) -> Self {
        Self { guid, unit: 0 }
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.guid)?;
        if self.unit != 0 {
            write!(f, ":{}", self.unit)?;
        }
        Ok(())
    }
}

/// 设备基本信息
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    /// 枚举结果中的位置
    pub node: u32,

    pub id: CameraId,

    /// 后端类型标识 (e.g. "libdc1394", "simulation")
    pub backend: String,
}

/// 出队策略 (dc1394capture_policy_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePolicy {
    /// 阻塞直到有一帧可用
    Wait,
    /// 立即返回，无帧时为 `None`
    Poll,
}

/// 已出队、尚未归还驱动的缓冲区
///
/// 不实现 Clone：一个槽位只能通过 [`CameraDevice::capture_enqueue`] 归还一次。
#[derive(Debug, PartialEq, Eq)]
pub struct BufferSlot {
    /// 环形缓冲区中的位置
    pub index: usize,
    /// 实际图像宽高
    pub width: u32,
    pub height: u32,
    /// 每行字节数
    pub stride: usize,
    /// 总线时间戳
    pub timestamp: Duration,
    /// 驱动报告的丢帧数 (frames_behind)
    pub frames_behind: u32,
}

// --- 后端 Trait 定义 ---

/// 1. 驱动入口：创建总线上下文
pub trait Driver: Send + Sync {
    /// 后端名称 (e.g. "libdc1394")
    fn name(&self) -> &'static str;

    /// 分配一个总线上下文 (dc1394_new)
    /// 失败时返回 [`crate::error::CameraError::Init`]
    fn new_context(&self) -> Result<Box<dyn BusContext>>;
}

/// 2. 总线上下文：枚举与打开设备
pub trait BusContext: Send + Sync {
    /// 扫描总线，返回当前所有相机的标识
    /// 枚举列表在返回前即被释放，只拷贝出标识
    fn enumerate(&self) -> LibResult<Vec<CameraId>>;

    /// 按 GUID 打开相机 (dc1394_camera_new_unit)
    fn open_camera(&self, id: CameraId) -> LibResult<Box<dyn CameraDevice>>;
}

/// 3. 已打开的相机：配置、采集与 Feature 控制
///
/// 每个方法对应 libdc1394 的一个同步调用，不做缓存或校验。
/// Drop 时释放相机句柄 (dc1394_camera_free)。
pub trait CameraDevice: Send {
    fn id(&self) -> CameraId;

    // --- 视频模式协商 ---

    fn supported_modes(&mut self) -> LibResult<Vec<VideoMode>>;

    /// 是否为可缩放 (Format7) 模式
    fn is_scalable(&self, mode: VideoMode) -> bool {
        mode.is_scalable()
    }

    /// 某个模式的色彩编码；Format7 返回当前设置的编码
    fn color_coding(&mut self, mode: VideoMode) -> LibResult<ColorCoding>;

    /// 某个模式的图像尺寸；Format7 返回最大尺寸
    fn image_size(&mut self, mode: VideoMode) -> LibResult<(u32, u32)>;

    fn set_iso_speed(&mut self, speed: IsoSpeed) -> LibResult<()>;

    fn set_video_mode(&mut self, mode: VideoMode) -> LibResult<()>;

    fn supported_frame_rates(&mut self, mode: VideoMode) -> LibResult<Vec<FrameRate>>;

    fn set_frame_rate(&mut self, rate: FrameRate) -> LibResult<()>;

    // --- 采集 ---

    /// 分配 DMA 环形缓冲区
    fn capture_setup(&mut self, num_buffers: u32) -> LibResult<()>;

    fn capture_stop(&mut self) -> LibResult<()>;

    fn set_transmission(&mut self, on: bool) -> LibResult<()>;

    fn set_power(&mut self, on: bool) -> LibResult<()>;

    /// 取出一帧；`Poll` 策略下无帧返回 `Ok(None)`
    fn capture_dequeue(&mut self, policy: CapturePolicy) -> LibResult<Option<BufferSlot>>;

    /// 已出队缓冲区的图像数据 (含行尾 Padding)
    fn buffer_data(&self, slot: &BufferSlot) -> &[u8];

    /// 归还缓冲区
    fn capture_enqueue(&mut self, slot: BufferSlot) -> LibResult<()>;

    // --- Feature ---

    fn feature_is_present(&mut self, feature: Feature) -> LibResult<bool>;
    fn feature_is_readable(&mut self, feature: Feature) -> LibResult<bool>;
    fn feature_is_switchable(&mut self, feature: Feature) -> LibResult<bool>;

    fn feature_value(&mut self, feature: Feature) -> LibResult<u32>;
    fn set_feature_value(&mut self, feature: Feature, value: u32) -> LibResult<()>;

    fn feature_power(&mut self, feature: Feature) -> LibResult<bool>;
    fn set_feature_power(&mut self, feature: Feature, on: bool) -> LibResult<()>;

    fn feature_modes(&mut self, feature: Feature) -> LibResult<FeatureModes>;
    fn feature_mode(&mut self, feature: Feature) -> LibResult<FeatureMode>;
    fn set_feature_mode(&mut self, feature: Feature, mode: FeatureMode) -> LibResult<()>;

    /// (min, max)
    fn feature_boundaries(&mut self, feature: Feature) -> LibResult<(u32, u32)>;
}

// 为 Box<T> 实现 CameraDevice，这样 Box<dyn CameraDevice> 也能当做 CameraDevice 使用
impl<D: CameraDevice + ?Sized> CameraDevice for Box<D> {
    fn id(&self) -> CameraId {
        (**self).id()
    }
    fn supported_modes(&mut self) -> LibResult<Vec<VideoMode>> {
        (**self).supported_modes()
    }
    fn is_scalable(&self, mode: VideoMode) -> bool {
        (**self).is_scalable(mode)
    }
    fn color_coding(&mut self, mode: VideoMode) -> LibResult<ColorCoding> {
        (**self).color_coding(mode)
    }
    fn image_size(&mut self, mode: VideoMode) -> LibResult<(u32, u32)> {
        (**self).image_size(mode)
    }
    fn set_iso_speed(&mut self, speed: IsoSpeed) -> LibResult<()> {
        (**self).set_iso_speed(speed)
    }
    fn set_video_mode(&mut self, mode: VideoMode) -> LibResult<()> {
        (**self).set_video_mode(mode)
    }
    fn supported_frame_rates(&mut self, mode: VideoMode) -> LibResult<Vec<FrameRate>> {
        (**self).supported_frame_rates(mode)
    }
    fn set_frame_rate(&mut self, rate: FrameRate) -> LibResult<()> {
        (**self).set_frame_rate(rate)
    }
    fn capture_setup(&mut self, num_buffers: u32) -> LibResult<()> {
        (**self).capture_setup(num_buffers)
    }
    fn capture_stop(&mut self) -> LibResult<()> {
        (**self).capture_stop()
    }
    fn set_transmission(&mut self, on: bool) -> LibResult<()> {
        (**self).set_transmission(on)
    }
    fn set_power(&mut self, on: bool) -> LibResult<()> {
        (**self).set_power(on)
    }
    fn capture_dequeue(&mut self, policy: CapturePolicy) -> LibResult<Option<BufferSlot>> {
        (**self).capture_dequeue(policy)
    }
    fn buffer_data(&self, slot: &BufferSlot) -> &[u8] {
        (**self).buffer_data(slot)
    }
    fn capture_enqueue(&mut self, slot: BufferSlot) -> LibResult<()> {
        (**self).capture_enqueue(slot)
    }
    fn feature_is_present(&mut self, feature: Feature) -> LibResult<bool> {
        (**self).feature_is_present(feature)
    }
    fn feature_is_readable(&mut self, feature: Feature) -> LibResult<bool> {
        (**self).feature_is_readable(feature)
    }
    fn feature_is_switchable(&mut self, feature: Feature) -> LibResult<bool> {
        (**self).feature_is_switchable(feature)
    }
    fn feature_value(&mut self, feature: Feature) -> LibResult<u32> {
        (**self).feature_value(feature)
    }
    fn set_feature_value(&mut self, feature: Feature, value: u32) -> LibResult<()> {
        (**self).set_feature_value(feature, value)
    }
    fn feature_power(&mut self, feature: Feature) -> LibResult<bool> {
        (**self).feature_power(feature)
    }
    fn set_feature_power(&mut self, feature: Feature, on: bool) -> LibResult<()> {
        (**self).set_feature_power(feature, on)
    }
    fn feature_modes(&mut self, feature: Feature) -> LibResult<FeatureModes> {
        (**self).feature_modes(feature)
    }
    fn feature_mode(&mut self, feature: Feature) -> LibResult<FeatureMode> {
        (**self).feature_mode(feature)
    }
    fn set_feature_mode(&mut self, feature: Feature, mode: FeatureMode) -> LibResult<()> {
        (**self).set_feature_mode(feature, mode)
    }
    fn feature_boundaries(&mut self, feature: Feature) -> LibResult<(u32, u32)> {
        (**self).feature_boundaries(feature)
    }
}
