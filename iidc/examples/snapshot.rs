// iidc/examples/snapshot.rs
//
// 从仿真相机抓一帧并保存为 PNG，同时打印会话状态的 JSON 快照

use anyhow::{bail, Result};
use iidc::prelude::*;
use iidc_simulation::{SimCamera, SimFeature, SimulatedBus};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "snapshot.png".into());

    let sim = SimulatedBus::new().with_camera(
        SimCamera::new(0x00b0_9d01_0000_1234)
            .mode(VideoMode::Mode640x480Mono8, &[FrameRate::F30])
            .mode(VideoMode::Mode640x480Mono16, &[FrameRate::F15])
            .feature(Feature::Gain, SimFeature::new(16, 0, 680)),
    );
    let bus = Bus::with_driver(sim.driver())?;

    let config = SessionConfig::from_json(r#"{ "speed": "S400" }"#)?;
    let mut cam = CameraSession::open(&bus, config, select::exact(PixelFormat::Gray8, 640, 480))?;
    println!("{}", serde_json::to_string_pretty(&cam.export_state()?)?);

    let frame = cam.read()?;
    if frame.format != PixelFormat::Gray8 {
        bail!("unexpected pixel format {}", frame.format);
    }

    // 去掉行尾 Padding
    let mut pixels = Vec::with_capacity(frame.width as usize * frame.height as usize);
    for y in 0..frame.height {
        if let Some(row) = frame.row(y) {
            pixels.extend_from_slice(row);
        }
    }
    let Some(img) = image::GrayImage::from_raw(frame.width, frame.height, pixels) else {
        bail!("frame buffer is shorter than {}x{}", frame.width, frame.height);
    };
    img.save(&path)?;
    println!("saved {}", path);

    Ok(())
}
