use std::time::Duration;

use iidc_core::error::{LibError, LibResult};
use iidc_core::feature::{Feature, FeatureMode, FeatureModes};
use iidc_core::traits::{BufferSlot, CameraDevice, CameraId, CapturePolicy};
use iidc_core::video::{ColorCoding, FrameRate, IsoSpeed, VideoMode};

use crate::camera::{SimCamera, SimFeature, SimMode};
use crate::{lock, record, Op, Shared};

// libdc1394 错误码 (dc1394/log.h)
const FUNCTION_NOT_SUPPORTED: i32 = -3;
const CAPTURE_IS_NOT_SET: i32 = -10;
const CAPTURE_IS_RUNNING: i32 = -11;
const INVALID_ARGUMENT_VALUE: i32 = -15;
const VALUE_OUTSIDE_RANGE: i32 = -16;
const INVALID_FEATURE: i32 = -17;
const INVALID_VIDEO_MODE: i32 = -19;
const INVALID_FRAMERATE: i32 = -20;

/// 相邻两帧时间戳的间隔 (约 30 fps)
const FRAME_INTERVAL_US: u64 = 33_333;

/// 仿真相机句柄
///
/// 生成的图像内容为 `(sequence + offset) as u8`，测试可以据此判断帧是否被复用。
#[derive(Debug)]
pub struct SimDevice {
    state: Shared,
    camera: SimCamera,
    speed: IsoSpeed,
    mode: Option<VideoMode>,
    rate: Option<FrameRate>,
    transmitting: bool,
    buffers: Vec<Vec<u8>>,
    outstanding: Vec<bool>,
    next_slot: usize,
    sequence: u64,
}

impl SimDevice {
    pub(crate) fn new(state: Shared, camera: SimCamera) -> Self {
        Self {
            state,
            camera,
            speed: IsoSpeed::S400,
            mode: None,
            rate: None,
            transmitting: false,
            buffers: Vec::new(),
            outstanding: Vec::new(),
            next_slot: 0,
            sequence: 0,
        }
    }

    pub fn speed(&self) -> IsoSpeed {
        self.speed
    }

    pub fn frame_rate(&self) -> Option<FrameRate> {
        self.rate
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// 编码/尺寸查询
    fn query_mode(&self, mode: VideoMode) -> LibResult<&SimMode> {
        if self.camera.failing_modes.contains(&mode) {
            return Err(LibError::failure("Generic failure"));
        }
        self.find_mode(mode)
    }

    fn find_mode(&self, mode: VideoMode) -> LibResult<&SimMode> {
        self.camera
            .find_mode(mode)
            .ok_or_else(|| LibError::new(INVALID_VIDEO_MODE, "Invalid video mode"))
    }

    fn current_mode(&self) -> LibResult<&SimMode> {
        let mode = self
            .mode
            .ok_or_else(|| LibError::new(INVALID_VIDEO_MODE, "Invalid video mode"))?;
        self.find_mode(mode)
    }

    fn feature(&self, feature: Feature) -> LibResult<&SimFeature> {
        self.camera
            .features
            .get(&feature)
            .ok_or_else(|| LibError::new(INVALID_FEATURE, "Invalid feature"))
    }

    fn feature_mut(&mut self, feature: Feature) -> LibResult<&mut SimFeature> {
        self.camera
            .features
            .get_mut(&feature)
            .ok_or_else(|| LibError::new(INVALID_FEATURE, "Invalid feature"))
    }

    fn readable(&self, feature: Feature) -> LibResult<&SimFeature> {
        let f = self.feature(feature)?;
        if !f.readable {
            return Err(LibError::new(
                FUNCTION_NOT_SUPPORTED,
                "Function not supported by this camera",
            ));
        }
        Ok(f)
    }

    fn fill(&mut self, slot: usize, stride: usize, height: u32) {
        let len = stride * height as usize;
        let seq = self.sequence;
        let buf = &mut self.buffers[slot];
        buf.clear();
        buf.extend((0..len).map(|i| (seq as usize + i) as u8));
    }
}

impl CameraDevice for SimDevice {
    fn id(&self) -> CameraId {
        self.camera.id
    }

    fn supported_modes(&mut self) -> LibResult<Vec<VideoMode>> {
        record(&self.state, Op::SupportedModes)?;
        Ok(self.camera.modes.iter().map(|m| m.mode).collect())
    }

    fn color_coding(&mut self, mode: VideoMode) -> LibResult<ColorCoding> {
        record(&self.state, Op::ColorCoding(mode))?;
        Ok(self.query_mode(mode)?.coding)
    }

    fn image_size(&mut self, mode: VideoMode) -> LibResult<(u32, u32)> {
        record(&self.state, Op::ImageSize(mode))?;
        let m = self.query_mode(mode)?;
        Ok((m.width, m.height))
    }

    fn set_iso_speed(&mut self, speed: IsoSpeed) -> LibResult<()> {
        record(&self.state, Op::SetIsoSpeed(speed))?;
        self.speed = speed;
        Ok(())
    }

    fn set_video_mode(&mut self, mode: VideoMode) -> LibResult<()> {
        record(&self.state, Op::SetVideoMode(mode))?;
        self.find_mode(mode)?;
        self.mode = Some(mode);
        Ok(())
    }

    fn supported_frame_rates(&mut self, mode: VideoMode) -> LibResult<Vec<FrameRate>> {
        record(&self.state, Op::SupportedFrameRates(mode))?;
        Ok(self.find_mode(mode)?.frame_rates.clone())
    }

    fn set_frame_rate(&mut self, rate: FrameRate) -> LibResult<()> {
        record(&self.state, Op::SetFrameRate(rate))?;
        if !self.current_mode()?.frame_rates.contains(&rate) {
            return Err(LibError::new(INVALID_FRAMERATE, "Invalid framerate"));
        }
        self.rate = Some(rate);
        Ok(())
    }

    fn capture_setup(&mut self, num_buffers: u32) -> LibResult<()> {
        record(&self.state, Op::CaptureSetup(num_buffers))?;
        if !self.buffers.is_empty() {
            return Err(LibError::new(CAPTURE_IS_RUNNING, "Capture is running"));
        }
        if num_buffers == 0 {
            return Err(LibError::new(INVALID_ARGUMENT_VALUE, "Invalid argument value"));
        }
        self.buffers = vec![Vec::new(); num_buffers as usize];
        self.outstanding = vec![false; num_buffers as usize];
        self.next_slot = 0;
        Ok(())
    }

    fn capture_stop(&mut self) -> LibResult<()> {
        record(&self.state, Op::CaptureStop)?;
        if self.buffers.is_empty() {
            return Err(LibError::new(CAPTURE_IS_NOT_SET, "Capture is not set"));
        }
        self.buffers.clear();
        self.outstanding.clear();
        Ok(())
    }

    fn set_transmission(&mut self, on: bool) -> LibResult<()> {
        record(&self.state, Op::SetTransmission(on))?;
        self.transmitting = on;
        Ok(())
    }

    fn set_power(&mut self, on: bool) -> LibResult<()> {
        record(&self.state, Op::SetPower(on))?;
        Ok(())
    }

    fn capture_dequeue(&mut self, policy: CapturePolicy) -> LibResult<Option<BufferSlot>> {
        let slot = self.next_slot;
        record(&self.state, Op::Dequeue(slot))?;
        if self.buffers.is_empty() {
            return Err(LibError::new(CAPTURE_IS_NOT_SET, "Capture is not set"));
        }
        {
            let mut s = lock(&self.state);
            if let Some(budget) = s.frame_budget.as_mut() {
                if *budget == 0 {
                    return match policy {
                        CapturePolicy::Poll => Ok(None),
                        CapturePolicy::Wait => Err(LibError::failure("Generic failure")),
                    };
                }
                *budget -= 1;
            }
        }
        if !self.transmitting {
            return match policy {
                CapturePolicy::Poll => Ok(None),
                CapturePolicy::Wait => Err(LibError::failure("Generic failure")),
            };
        }
        if self.outstanding[slot] {
            // 所有缓冲区都在用户手里，真实驱动会永远阻塞
            return Err(LibError::failure("Generic failure"));
        }

        let m = self.current_mode()?.clone();
        let stride = (m.width * m.coding.bits_per_pixel() / 8) as usize;
        self.fill(slot, stride, m.height);
        self.outstanding[slot] = true;
        self.next_slot = (slot + 1) % self.buffers.len();

        let timestamp = Duration::from_micros(self.sequence * FRAME_INTERVAL_US);
        self.sequence += 1;

        Ok(Some(BufferSlot {
            index: slot,
            width: m.width,
            height: m.height,
            stride,
            timestamp,
            frames_behind: 0,
        }))
    }

    fn buffer_data(&self, slot: &BufferSlot) -> &[u8] {
        self.buffers
            .get(slot.index)
            .map(|b| b.as_slice())
            .unwrap_or_default()
    }

    fn capture_enqueue(&mut self, slot: BufferSlot) -> LibResult<()> {
        record(&self.state, Op::Enqueue(slot.index))?;
        match self.outstanding.get_mut(slot.index) {
            Some(flag) if *flag => {
                *flag = false;
                Ok(())
            }
            _ => Err(LibError::new(INVALID_ARGUMENT_VALUE, "Invalid argument value")),
        }
    }

    fn feature_is_present(&mut self, feature: Feature) -> LibResult<bool> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.camera.features.contains_key(&feature))
    }

    fn feature_is_readable(&mut self, feature: Feature) -> LibResult<bool> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.feature(feature)?.readable)
    }

    fn feature_is_switchable(&mut self, feature: Feature) -> LibResult<bool> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.feature(feature)?.switchable)
    }

    fn feature_value(&mut self, feature: Feature) -> LibResult<u32> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.readable(feature)?.value)
    }

    fn set_feature_value(&mut self, feature: Feature, value: u32) -> LibResult<()> {
        record(&self.state, Op::FeatureSet(feature))?;
        let f = self.feature_mut(feature)?;
        if value < f.min || value > f.max {
            return Err(LibError::new(
                VALUE_OUTSIDE_RANGE,
                "Requested value is outside the valid range",
            ));
        }
        f.value = value;
        Ok(())
    }

    fn feature_power(&mut self, feature: Feature) -> LibResult<bool> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.feature(feature)?.power)
    }

    fn set_feature_power(&mut self, feature: Feature, on: bool) -> LibResult<()> {
        record(&self.state, Op::FeatureSet(feature))?;
        let f = self.feature_mut(feature)?;
        if !f.switchable {
            return Err(LibError::new(
                FUNCTION_NOT_SUPPORTED,
                "Function not supported by this camera",
            ));
        }
        f.power = on;
        Ok(())
    }

    fn feature_modes(&mut self, feature: Feature) -> LibResult<FeatureModes> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.feature(feature)?.modes)
    }

    fn feature_mode(&mut self, feature: Feature) -> LibResult<FeatureMode> {
        record(&self.state, Op::FeatureGet(feature))?;
        Ok(self.readable(feature)?.mode)
    }

    fn set_feature_mode(&mut self, feature: Feature, mode: FeatureMode) -> LibResult<()> {
        record(&self.state, Op::FeatureSet(feature))?;
        let f = self.feature_mut(feature)?;
        if !f.modes.contains(mode.flag()) {
            return Err(LibError::new(INVALID_ARGUMENT_VALUE, "Invalid argument value"));
        }
        f.mode = mode;
        Ok(())
    }

    fn feature_boundaries(&mut self, feature: Feature) -> LibResult<(u32, u32)> {
        record(&self.state, Op::FeatureGet(feature))?;
        let f = self.readable(feature)?;
        Ok((f.min, f.max))
    }
}

impl Drop for SimDevice {
    fn drop(&mut self) {
        let id = self.camera.id;
        let mut s = lock(&self.state);
        s.journal.push(Op::CameraFree(id));
        s.live_cameras -= 1;
    }
}
