use std::ptr;

use iidc_core::error::{LibError, LibResult};
use iidc_core::feature::{Feature, FeatureMode, FeatureModes};
use iidc_core::traits::{BufferSlot, BusContext, CameraDevice, CameraId, CapturePolicy};
use iidc_core::video::{ColorCoding, FrameRate, IsoSpeed, VideoMode};
use libdc1394_sys as ffi;

use crate::pixel_map::{self, dc1394_try, is_true, switch};
use crate::stream::CaptureRing;

/// 总线上下文 (dc1394_t)
#[derive(Debug)]
pub struct Dc1394Context {
    handle: *mut ffi::dc1394_t,
}

// libdc1394 的上下文可以跨线程使用，调用的串行化由上层的会话保证
unsafe impl Send for Dc1394Context {}
unsafe impl Sync for Dc1394Context {}

impl Dc1394Context {
    pub fn new() -> Option<Self> {
        let handle = unsafe { ffi::dc1394_new() };
        if handle.is_null() {
            None
        } else {
            Some(Self { handle })
        }
    }
}

impl Drop for Dc1394Context {
    fn drop(&mut self) {
        tracing::trace!(target: "iidc::dc1394", "dc1394_free");
        unsafe { ffi::dc1394_free(self.handle) };
    }
}

/// 枚举结果，Drop 时释放 (dc1394_camera_free_list)
struct CameraList(*mut ffi::dc1394camera_list_t);

impl CameraList {
    fn ids(&self) -> Vec<CameraId> {
        let ids = unsafe {
            let list = &*self.0;
            std::slice::from_raw_parts(list.ids, list.num as usize)
        };
        ids.iter()
            .map(|id| CameraId {
                guid: id.guid,
                unit: id.unit,
            })
            .collect()
    }
}

impl Drop for CameraList {
    fn drop(&mut self) {
        unsafe { ffi::dc1394_camera_free_list(self.0) };
    }
}

impl BusContext for Dc1394Context {
    fn enumerate(&self) -> LibResult<Vec<CameraId>> {
        let mut list: *mut ffi::dc1394camera_list_t = ptr::null_mut();
        dc1394_try!(ffi::dc1394_camera_enumerate(self.handle, &mut list));
        if list.is_null() {
            return Err(LibError::failure("dc1394_camera_enumerate returned no list"));
        }
        // 只拷贝出 ID，列表本身立即释放
        Ok(CameraList(list).ids())
    }

    fn open_camera(&self, id: CameraId) -> LibResult<Box<dyn CameraDevice>> {
        tracing::trace!(target: "iidc::dc1394", "dc1394_camera_new_unit {}", id);
        let handle = unsafe {
            ffi::dc1394_camera_new_unit(self.handle, id.guid, std::os::raw::c_int::from(id.unit))
        };
        if handle.is_null() {
            return Err(LibError::failure(format!("Failed to initialise camera {}", id)));
        }
        Ok(Box::new(Dc1394Camera {
            handle,
            id,
            ring: CaptureRing::default(),
        }))
    }
}

/// 已打开的相机 (dc1394camera_t)
#[derive(Debug)]
pub struct Dc1394Camera {
    pub(crate) handle: *mut ffi::dc1394camera_t,
    id: CameraId,
    pub(crate) ring: CaptureRing,
}

unsafe impl Send for Dc1394Camera {}

impl Drop for Dc1394Camera {
    fn drop(&mut self) {
        tracing::trace!(target: "iidc::dc1394", "dc1394_camera_free {}", self.id);
        unsafe { ffi::dc1394_camera_free(self.handle) };
    }
}

impl CameraDevice for Dc1394Camera {
    fn id(&self) -> CameraId {
        self.id
    }

    fn supported_modes(&mut self) -> LibResult<Vec<VideoMode>> {
        let mut modes: ffi::dc1394video_modes_t = unsafe { std::mem::zeroed() };
        dc1394_try!(ffi::dc1394_video_get_supported_modes(self.handle, &mut modes));
        modes.modes[..modes.num as usize]
            .iter()
            .map(|m| pixel_map::from_ffi_mode(*m))
            .collect()
    }

    fn is_scalable(&self, mode: VideoMode) -> bool {
        is_true(unsafe { ffi::dc1394_is_video_mode_scalable(mode.raw() as _) })
    }

    fn color_coding(&mut self, mode: VideoMode) -> LibResult<ColorCoding> {
        let mut coding = ffi::dc1394color_coding_t::DC1394_COLOR_CODING_MONO8;
        if self.is_scalable(mode) {
            dc1394_try!(ffi::dc1394_format7_get_color_coding(
                self.handle,
                mode.raw() as _,
                &mut coding
            ));
        } else {
            dc1394_try!(ffi::dc1394_get_color_coding_from_video_mode(
                self.handle,
                mode.raw() as _,
                &mut coding
            ));
        }
        pixel_map::from_ffi_coding(coding)
    }

    fn image_size(&mut self, mode: VideoMode) -> LibResult<(u32, u32)> {
        let (mut w, mut h) = (0u32, 0u32);
        if self.is_scalable(mode) {
            dc1394_try!(ffi::dc1394_format7_get_max_image_size(
                self.handle,
                mode.raw() as _,
                &mut w,
                &mut h
            ));
        } else {
            dc1394_try!(ffi::dc1394_get_image_size_from_video_mode(
                self.handle,
                mode.raw() as _,
                &mut w,
                &mut h
            ));
        }
        Ok((w, h))
    }

    fn set_iso_speed(&mut self, speed: IsoSpeed) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_video_set_iso_speed(self.handle, speed.raw() as _));
        Ok(())
    }

    fn set_video_mode(&mut self, mode: VideoMode) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_video_set_mode(self.handle, mode.raw() as _));
        Ok(())
    }

    fn supported_frame_rates(&mut self, mode: VideoMode) -> LibResult<Vec<FrameRate>> {
        let mut rates: ffi::dc1394framerates_t = unsafe { std::mem::zeroed() };
        dc1394_try!(ffi::dc1394_video_get_supported_framerates(
            self.handle,
            mode.raw() as _,
            &mut rates
        ));
        rates.framerates[..rates.num as usize]
            .iter()
            .map(|r| pixel_map::from_ffi_frame_rate(*r))
            .collect()
    }

    fn set_frame_rate(&mut self, rate: FrameRate) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_video_set_framerate(self.handle, rate.raw() as _));
        Ok(())
    }

    fn capture_setup(&mut self, num_buffers: u32) -> LibResult<()> {
        self.setup_ring(num_buffers)
    }

    fn capture_stop(&mut self) -> LibResult<()> {
        self.stop_ring()
    }

    fn set_transmission(&mut self, on: bool) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_video_set_transmission(self.handle, switch(on)));
        Ok(())
    }

    fn set_power(&mut self, on: bool) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_camera_set_power(self.handle, switch(on)));
        Ok(())
    }

    fn capture_dequeue(&mut self, policy: CapturePolicy) -> LibResult<Option<BufferSlot>> {
        self.dequeue(policy)
    }

    fn buffer_data(&self, slot: &BufferSlot) -> &[u8] {
        self.ring.data(slot)
    }

    fn capture_enqueue(&mut self, slot: BufferSlot) -> LibResult<()> {
        self.enqueue(slot)
    }

    fn feature_is_present(&mut self, feature: Feature) -> LibResult<bool> {
        self.is_present(feature)
    }

    fn feature_is_readable(&mut self, feature: Feature) -> LibResult<bool> {
        self.is_readable(feature)
    }

    fn feature_is_switchable(&mut self, feature: Feature) -> LibResult<bool> {
        self.is_switchable(feature)
    }

    fn feature_value(&mut self, feature: Feature) -> LibResult<u32> {
        self.value(feature)
    }

    fn set_feature_value(&mut self, feature: Feature, value: u32) -> LibResult<()> {
        self.set_value(feature, value)
    }

    fn feature_power(&mut self, feature: Feature) -> LibResult<bool> {
        self.power(feature)
    }

    fn set_feature_power(&mut self, feature: Feature, on: bool) -> LibResult<()> {
        self.set_power_of(feature, on)
    }

    fn feature_modes(&mut self, feature: Feature) -> LibResult<FeatureModes> {
        self.modes(feature)
    }

    fn feature_mode(&mut self, feature: Feature) -> LibResult<FeatureMode> {
        self.mode(feature)
    }

    fn set_feature_mode(&mut self, feature: Feature, mode: FeatureMode) -> LibResult<()> {
        self.set_mode(feature, mode)
    }

    fn feature_boundaries(&mut self, feature: Feature) -> LibResult<(u32, u32)> {
        self.boundaries(feature)
    }
}
