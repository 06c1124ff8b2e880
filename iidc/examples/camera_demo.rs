// iidc/examples/camera_demo.rs
//
// cargo run --example camera_demo                      # 仿真总线
// cargo run --example camera_demo --features libdc1394 # 真实相机

use anyhow::Result;
use iidc::prelude::*;
use iidc_simulation::{SimCamera, SimFeature, SimulatedBus};
use std::time::Instant;

fn open_bus() -> Result<Bus> {
    if cfg!(feature = "libdc1394") {
        return Ok(Bus::new()?);
    }

    println!("libdc1394 feature disabled, using a simulated camera");
    let sim = SimulatedBus::new().with_camera(
        SimCamera::new(0x0814_4360_0000_0001)
            .mode(VideoMode::Mode640x480Mono8, &[FrameRate::F15, FrameRate::F30])
            .mode(VideoMode::Mode640x480Yuv422, &[FrameRate::F15])
            .feature(Feature::Brightness, SimFeature::new(128, 0, 255))
            .feature(Feature::Shutter, SimFeature::new(300, 1, 4095)),
    );
    Ok(Bus::with_driver(sim.driver())?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // 1. 打开总线并列出相机
    let mut bus = open_bus()?;
    for cam in bus.list_cameras()? {
        println!("[{}] {} ({})", cam.node, cam.id, cam.backend);
    }

    // 2. 打开第一台相机，选择画质最好的模式
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::best_quality())?;
    println!(
        "{}: {} {}x{} {} @ {}",
        cam,
        cam.video_mode(),
        cam.width(),
        cam.height(),
        cam.pixel_format(),
        cam.frame_rate()
    );

    // 会话持有自己的总线引用，这里可以提前释放
    bus.close();

    // 3. 调整一个 Feature
    if cam.feature_present(Feature::Brightness)? {
        let (min, max) = cam.feature_bounds(Feature::Brightness)?;
        cam.set_feature_value(Feature::Brightness, (min + max) / 2)?;
        println!("brightness = {}", cam.feature_value(Feature::Brightness)?);
    }

    // 4. 采集 100 帧并统计 FPS
    let start = Instant::now();
    for _ in 0..100 {
        let frame = cam.read()?;
        if frame.sequence % 25 == 0 {
            println!(
                "#{:<4} {}x{} stride={} t={:?}",
                frame.sequence, frame.width, frame.height, frame.stride, frame.timestamp
            );
        }
    }
    let elapsed = start.elapsed().as_secs_f64();
    println!("100 frames in {:.2}s ({:.1} fps)", elapsed, 100.0 / elapsed);

    cam.close();
    Ok(())
}
