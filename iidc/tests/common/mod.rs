#![allow(dead_code)]

use iidc::prelude::*;
use iidc_simulation::{Op, SimCamera, SimFeature, SimulatedBus};

pub const GUID_A: u64 = 0x0814_4360_0000_00a1;
pub const GUID_B: u64 = 0x0814_4360_0000_00b2;

/// 640x480 mono8 @ {15, 30}
pub fn mono_camera(guid: u64) -> SimCamera {
    SimCamera::new(guid).mode(VideoMode::Mode640x480Mono8, &[FrameRate::F15, FrameRate::F30])
}

pub fn featured_camera(guid: u64) -> SimCamera {
    mono_camera(guid)
        .feature(Feature::Brightness, SimFeature::new(128, 0, 255))
        .feature(Feature::Shutter, SimFeature::new(300, 1, 4095))
        .feature(Feature::Trigger, SimFeature::new(0, 0, 3).write_only())
}

pub fn open_bus(sim: &SimulatedBus) -> Bus {
    Bus::with_driver(sim.driver()).expect("simulated bus opens")
}

pub fn configuration_calls(sim: &SimulatedBus) -> usize {
    sim.count(Op::is_configuration)
}

pub fn capture_ops(sim: &SimulatedBus) -> Vec<Op> {
    sim.journal()
        .into_iter()
        .filter(|op| matches!(op, Op::Dequeue(_) | Op::Enqueue(_)))
        .collect()
}
