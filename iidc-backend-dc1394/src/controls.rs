use iidc_core::error::LibResult;
use iidc_core::feature::{Feature, FeatureMode, FeatureModes};
use libdc1394_sys as ffi;

use crate::device::Dc1394Camera;
use crate::pixel_map::{self, dc1394_try, is_true, switch};

// --- Feature 寄存器访问 ---
// 全部直接透传给 libdc1394，不缓存、不做范围检查

impl Dc1394Camera {
    pub(crate) fn is_present(&mut self, feature: Feature) -> LibResult<bool> {
        let mut value = ffi::dc1394bool_t::DC1394_FALSE;
        dc1394_try!(ffi::dc1394_feature_is_present(
            self.handle,
            feature.raw() as _,
            &mut value
        ));
        Ok(is_true(value))
    }

    pub(crate) fn is_readable(&mut self, feature: Feature) -> LibResult<bool> {
        let mut value = ffi::dc1394bool_t::DC1394_FALSE;
        dc1394_try!(ffi::dc1394_feature_is_readable(
            self.handle,
            feature.raw() as _,
            &mut value
        ));
        Ok(is_true(value))
    }

    pub(crate) fn is_switchable(&mut self, feature: Feature) -> LibResult<bool> {
        let mut value = ffi::dc1394bool_t::DC1394_FALSE;
        dc1394_try!(ffi::dc1394_feature_is_switchable(
            self.handle,
            feature.raw() as _,
            &mut value
        ));
        Ok(is_true(value))
    }

    pub(crate) fn value(&mut self, feature: Feature) -> LibResult<u32> {
        let mut value = 0u32;
        dc1394_try!(ffi::dc1394_feature_get_value(
            self.handle,
            feature.raw() as _,
            &mut value
        ));
        Ok(value)
    }

    pub(crate) fn set_value(&mut self, feature: Feature, value: u32) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_feature_set_value(
            self.handle,
            feature.raw() as _,
            value
        ));
        Ok(())
    }

    pub(crate) fn power(&mut self, feature: Feature) -> LibResult<bool> {
        let mut pwr = ffi::dc1394switch_t::DC1394_OFF;
        dc1394_try!(ffi::dc1394_feature_get_power(
            self.handle,
            feature.raw() as _,
            &mut pwr
        ));
        Ok(pwr == ffi::dc1394switch_t::DC1394_ON)
    }

    pub(crate) fn set_power_of(&mut self, feature: Feature, on: bool) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_feature_set_power(
            self.handle,
            feature.raw() as _,
            switch(on)
        ));
        Ok(())
    }

    pub(crate) fn modes(&mut self, feature: Feature) -> LibResult<FeatureModes> {
        let mut modes: ffi::dc1394feature_modes_t = unsafe { std::mem::zeroed() };
        dc1394_try!(ffi::dc1394_feature_get_modes(
            self.handle,
            feature.raw() as _,
            &mut modes
        ));
        Ok(pixel_map::from_ffi_feature_modes(&modes))
    }

    pub(crate) fn mode(&mut self, feature: Feature) -> LibResult<FeatureMode> {
        let mut mode = ffi::dc1394feature_mode_t::DC1394_FEATURE_MODE_MANUAL;
        dc1394_try!(ffi::dc1394_feature_get_mode(
            self.handle,
            feature.raw() as _,
            &mut mode
        ));
        pixel_map::from_ffi_feature_mode(mode)
    }

    pub(crate) fn set_mode(&mut self, feature: Feature, mode: FeatureMode) -> LibResult<()> {
        dc1394_try!(ffi::dc1394_feature_set_mode(
            self.handle,
            feature.raw() as _,
            mode.raw() as _
        ));
        Ok(())
    }

    pub(crate) fn boundaries(&mut self, feature: Feature) -> LibResult<(u32, u32)> {
        let (mut min, mut max) = (0u32, 0u32);
        dc1394_try!(ffi::dc1394_feature_get_boundaries(
            self.handle,
            feature.raw() as _,
            &mut min,
            &mut max
        ));
        Ok((min, max))
    }
}
