use std::ptr;
use std::time::Duration;

use iidc_core::error::{LibError, LibResult};
use iidc_core::traits::{BufferSlot, CapturePolicy};
use libdc1394_sys as ffi;

use crate::device::Dc1394Camera;
use crate::pixel_map::dc1394_try;

/// 已出队帧的指针表，按 dc1394video_frame_t::id 索引
#[derive(Debug, Default)]
pub struct CaptureRing {
    frames: Vec<*mut ffi::dc1394video_frame_t>,
}

impl CaptureRing {
    pub(crate) fn data(&self, slot: &BufferSlot) -> &[u8] {
        match self.frames.get(slot.index) {
            Some(frame) if !frame.is_null() => unsafe {
                let frame = &**frame;
                std::slice::from_raw_parts(frame.image, frame.image_bytes as usize)
            },
            _ => &[],
        }
    }
}

impl Dc1394Camera {
    pub(crate) fn setup_ring(&mut self, num_buffers: u32) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_capture_setup(
            self.handle,
            num_buffers,
            ffi::DC1394_CAPTURE_FLAGS_DEFAULT
        ));
        self.ring.frames = vec![ptr::null_mut(); num_buffers as usize];
        Ok(())
    }

    pub(crate) fn stop_ring(&mut self) -> LibResult<()> {
        self.ring.frames.clear();
        dc1394_try!(ffi::dc1394_capture_stop(self.handle));
        Ok(())
    }

    pub(crate) fn dequeue(&mut self, policy: CapturePolicy) -> LibResult<Option<BufferSlot>> {
        let policy = match policy {
            CapturePolicy::Wait => ffi::dc1394capture_policy_t::DC1394_CAPTURE_POLICY_WAIT,
            CapturePolicy::Poll => ffi::dc1394capture_policy_t::DC1394_CAPTURE_POLICY_POLL,
        };
        let mut frame: *mut ffi::dc1394video_frame_t = ptr::null_mut();
        dc1394_try!(ffi::dc1394_capture_dequeue(self.handle, policy, &mut frame));
        if frame.is_null() {
            // POLL 模式下没有新帧
            return Ok(None);
        }

        let raw = unsafe { &*frame };
        let index = raw.id as usize;
        match self.ring.frames.get_mut(index) {
            Some(entry) => *entry = frame,
            None => {
                // 环形缓冲区之外的帧，立即还给驱动
                unsafe { ffi::dc1394_capture_enqueue(self.handle, frame) };
                return Err(LibError::failure(format!(
                    "Frame id {} outside capture ring",
                    index
                )));
            }
        }

        Ok(Some(BufferSlot {
            index,
            width: raw.size[0],
            height: raw.size[1],
            stride: raw.stride as usize,
            timestamp: Duration::from_micros(raw.timestamp),
            frames_behind: raw.frames_behind,
        }))
    }

    pub(crate) fn enqueue(&mut self, slot: BufferSlot) -> LibResult<()> {
        let frame = match self.ring.frames.get_mut(slot.index) {
            Some(entry) if !entry.is_null() => std::mem::replace(entry, ptr::null_mut()),
            _ => {
                return Err(LibError::failure(format!(
                    "Buffer {} is not dequeued",
                    slot.index
                )))
            }
        };
        dc1394_try!(ffi::dc1394_capture_enqueue(self.handle, frame));
        Ok(())
    }
}
