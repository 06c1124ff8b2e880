mod common;

use std::error::Error as _;

use common::*;
use iidc::prelude::*;
use iidc_core::error::BoxError;
use iidc_simulation::{Op, SimCamera, SimulatedBus};

#[test]
fn opens_node_one_of_two_cameras() -> anyhow::Result<()> {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .with_camera(mono_camera(GUID_B));
    let bus = open_bus(&sim);

    let cam = CameraSession::open(&bus, SessionConfig::new().node(1), |_: &[ModeCandidate]| {
        Ok::<usize, BoxError>(0)
    })?;

    assert!(cam.is_open());
    assert_eq!(cam.state(), SessionState::Streaming);
    assert_eq!(cam.camera_id(), CameraId::new(GUID_B));
    assert_eq!(cam.node(), 1);
    assert_eq!((cam.width(), cam.height()), (640, 480));
    assert_eq!(cam.pixel_format(), PixelFormat::Gray8);
    assert_eq!(cam.color_coding(), ColorCoding::Mono8);
    assert_eq!(cam.video_mode(), VideoMode::Mode640x480Mono8);
    assert_eq!(cam.to_string(), format!("CameraSession({:016x})", GUID_B));
    Ok(())
}

#[test]
fn node_out_of_range_touches_no_hardware() {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new().node(3), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::Index { index: 3, count: 1 }));
    assert_eq!(configuration_calls(&sim), 0);
    assert!(!sim.journal().iter().any(|op| matches!(op, Op::CameraNew(_))));
    assert_eq!(bus.ref_count(), 1);
}

#[test]
fn empty_bus_reports_setup_hints() {
    let sim = SimulatedBus::new();
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::NoCameraFound));
    let msg = err.to_string();
    assert!(msg.contains("kernel modules"));
    assert!(msg.contains("/dev/raw1394"));
}

#[test]
fn enumeration_failure_is_no_camera() {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .fail_on("dc1394_camera_enumerate", LibError::failure("Generic failure"));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::NoCamera(_)));
    assert!(err.to_string().ends_with("Generic failure"));
}

#[test]
fn picks_highest_rate_when_not_forced() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;

    assert_eq!(cam.frame_rate(), FrameRate::F30);
    assert_eq!(sim.count(|op| *op == Op::SetFrameRate(FrameRate::F30)), 1);
    Ok(())
}

#[test]
fn forced_rate_skips_rate_query() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let config = SessionConfig::new().frame_rate(FrameRate::F15);
    let cam = CameraSession::open(&bus, config, select::first())?;

    assert_eq!(cam.frame_rate(), FrameRate::F15);
    assert_eq!(sim.count(|op| matches!(op, Op::SupportedFrameRates(_))), 0);
    Ok(())
}

#[test]
fn speed_is_set_before_mode() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let _cam = CameraSession::open(
        &bus,
        SessionConfig::new().speed(IsoSpeed::S800),
        select::first(),
    )?;

    let journal = sim.journal();
    let speed = journal.iter().position(|op| *op == Op::SetIsoSpeed(IsoSpeed::S800));
    let mode = journal
        .iter()
        .position(|op| *op == Op::SetVideoMode(VideoMode::Mode640x480Mono8));
    let rate = journal.iter().position(|op| matches!(op, Op::SetFrameRate(_)));
    assert!(speed.is_some() && speed < mode && mode < rate);
    assert!(journal.contains(&Op::CaptureSetup(CAPTURE_BUFFER_COUNT)));
    assert_eq!(journal.last(), Some(&Op::SetTransmission(true)));
    Ok(())
}

#[test]
fn mode_without_rates_is_a_config_error() {
    let sim = SimulatedBus::new()
        .with_camera(SimCamera::new(GUID_A).mode(VideoMode::Mode640x480Mono8, &[]));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::Config(_)));
    assert_eq!(sim.live_cameras(), 0);
}

#[test]
fn scalable_mode_is_rejected_before_configuration() {
    let sim = SimulatedBus::new().with_camera(SimCamera::new(GUID_A).scalable_mode(
        0,
        ColorCoding::Mono8,
        1280,
        1024,
    ));
    let bus = open_bus(&sim);

    let mut seen = Vec::new();
    let config = SessionConfig::new().frame_rate(FrameRate::F30);
    let err = CameraSession::open(
        &bus,
        config,
        select::from_fn(|modes| {
            seen.extend_from_slice(modes);
            Ok(0)
        }),
    )
    .unwrap_err();

    assert_eq!(seen.len(), 1);
    assert!(seen[0].scalable);
    assert_eq!((seen[0].width, seen[0].height), (1280, 1024));
    assert!(matches!(
        err,
        CameraError::UnsupportedMode {
            coding: ColorCoding::Mono8,
            width: 1280,
            height: 1024
        }
    ));
    assert_eq!(configuration_calls(&sim), 0);
    assert_eq!(bus.ref_count(), 1);
}

#[test]
fn unqueryable_format7_and_exif_are_skipped() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(
        mono_camera(GUID_A)
            .failing_mode(VideoMode::Format7(0))
            .failing_mode(VideoMode::Exif),
    );
    let bus = open_bus(&sim);

    let mut seen = Vec::new();
    let cam = CameraSession::open(
        &bus,
        SessionConfig::new(),
        select::from_fn(|modes| {
            seen.extend_from_slice(modes);
            Ok(modes.len() - 1)
        }),
    )?;

    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].coding, ColorCoding::Mono8);
    assert!(!seen[0].scalable);
    assert_eq!(cam.video_mode(), VideoMode::Mode640x480Mono8);
    assert_eq!(cam.pixel_format(), PixelFormat::Gray8);
    assert_eq!(sim.count(|op| *op == Op::ImageSize(VideoMode::Exif)), 0);
    Ok(())
}

#[test]
fn fixed_mode_query_failure_aborts_open() {
    let sim = SimulatedBus::new()
        .with_camera(SimCamera::new(GUID_A).failing_mode(VideoMode::Mode640x480Mono8));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::Library { .. }));
    assert_eq!(configuration_calls(&sim), 0);
    assert_eq!(bus.ref_count(), 1);
}

#[test]
fn unmapped_coding_is_unsupported_format() {
    let sim = SimulatedBus::new()
        .with_camera(SimCamera::new(GUID_A).mode(VideoMode::Mode640x480Yuv411, &[FrameRate::F15]));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::UnsupportedFormat(ColorCoding::Yuv411)));
    assert_eq!(configuration_calls(&sim), 0);
}

#[test]
fn selector_failure_is_wrapped_and_rolled_back() {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let err = CameraSession::open(
        &bus,
        SessionConfig::new(),
        select::from_fn(|_| Err("user cancelled".into())),
    )
    .unwrap_err();

    assert!(matches!(err, CameraError::Selection { .. }));
    assert_eq!(
        err.to_string(),
        "Error during selection of camera resolution: user cancelled"
    );
    assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("user cancelled"));
    assert_eq!(bus.ref_count(), 1);
    assert_eq!(sim.live_cameras(), 0);
}

#[test]
fn selector_index_out_of_range() {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::from_fn(|modes| Ok(modes.len())))
        .unwrap_err();

    assert!(matches!(err, CameraError::Selection { .. }));
    assert_eq!(configuration_calls(&sim), 0);
    assert_eq!(sim.live_cameras(), 0);
}

#[test]
fn exact_selector_reports_missing_mode() {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let err = CameraSession::open(
        &bus,
        SessionConfig::new(),
        select::exact(PixelFormat::Rgb8, 1024, 768),
    )
    .unwrap_err();

    assert!(err.to_string().contains("not supported by camera"));
}

#[test]
fn library_failure_rolls_back_everything() {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .fail_on("dc1394_video_set_transmission", LibError::failure("Generic failure"));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    match &err {
        CameraError::Library { operation, source } => {
            assert_eq!(*operation, "dc1394_video_set_transmission");
            assert_eq!(source.message, "Generic failure");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let journal = sim.journal();
    let setup = journal.iter().position(|op| matches!(op, Op::CaptureSetup(_)));
    let stop = journal.iter().position(|op| *op == Op::CaptureStop);
    assert!(setup.is_some() && setup < stop);
    assert_eq!(journal.last(), Some(&Op::CameraFree(CameraId::new(GUID_A))));
    assert_eq!(bus.ref_count(), 1);
    assert_eq!(sim.live_cameras(), 0);
}

#[test]
fn capture_setup_failure_never_starts_transmission() {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .fail_on("dc1394_capture_setup", LibError::new(-11, "Capture is running"));
    let bus = open_bus(&sim);

    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert_eq!(err.to_string(), "dc1394_capture_setup failed: Capture is running");
    assert_eq!(sim.count(|op| *op == Op::SetTransmission(true)), 0);
    assert_eq!(sim.count(|op| *op == Op::CaptureStop), 0);
    assert_eq!(bus.ref_count(), 1);

    // 占用已解除，修好之后可以重新打开
    sim.clear_failures();
    assert!(CameraSession::open(&bus, SessionConfig::new(), select::first()).is_ok());
}

#[test]
fn read_returns_previous_buffer_first() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;
    sim.clear_journal();

    for _ in 0..3 {
        cam.read()?;
    }
    assert_eq!(
        capture_ops(&sim),
        vec![
            Op::Dequeue(0),
            Op::Enqueue(0),
            Op::Dequeue(1),
            Op::Enqueue(1),
            Op::Dequeue(2),
        ]
    );

    // 超过缓冲区数量也不会耗尽环形缓冲区
    for _ in 0..(2 * CAPTURE_BUFFER_COUNT) {
        cam.read()?;
    }
    Ok(())
}

#[test]
fn frames_are_owned_copies() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;

    let first = cam.read()?;
    let snapshot = first.data.clone();
    let second = cam.read()?;

    assert_eq!(first.data, snapshot);
    assert_eq!((first.sequence, second.sequence), (0, 1));
    assert_eq!((first.data[0], second.data[0]), (0, 1));
    assert!(second.timestamp > first.timestamp);
    assert_eq!(first.format, PixelFormat::Gray8);
    assert_eq!(first.stride, 640);
    assert_eq!(first.data.len(), 640 * 480);
    assert_eq!(first.row(1).map(|r| r[0]), Some((640 % 256) as u8));
    Ok(())
}

#[test]
fn try_read_polls() -> anyhow::Result<()> {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .frame_budget(1);
    let bus = open_bus(&sim);
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;

    assert!(cam.try_read()?.is_some());
    assert!(cam.try_read()?.is_none());
    Ok(())
}

#[test]
fn failed_dequeue_is_a_capture_error() -> anyhow::Result<()> {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .frame_budget(0);
    let bus = open_bus(&sim);
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;

    let err = cam.read().unwrap_err();
    assert!(matches!(err, CameraError::Capture(_)));
    assert!(cam.is_open());
    Ok(())
}

#[test]
fn close_is_idempotent_and_releases_in_order() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);
    let mut cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;
    cam.read()?;
    sim.clear_journal();

    cam.close();
    cam.close();

    assert!(!cam.is_open());
    assert_eq!(cam.state(), SessionState::Closed);
    assert_eq!(
        sim.journal(),
        vec![
            Op::Enqueue(0),
            Op::SetTransmission(false),
            Op::CaptureStop,
            Op::SetPower(false),
            Op::CameraFree(CameraId::new(GUID_A)),
        ]
    );
    assert!(matches!(cam.read(), Err(CameraError::Closed)));
    assert!(matches!(cam.try_read(), Err(CameraError::Closed)));
    assert_eq!(bus.ref_count(), 1);

    // 协商结果仍然可读
    assert_eq!(cam.width(), 640);
    Ok(())
}

#[test]
fn drop_closes_the_session() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    {
        let _cam = CameraSession::open(&bus, SessionConfig::new(), select::first())?;
        assert_eq!(bus.ref_count(), 2);
        assert_eq!(sim.live_cameras(), 1);
    }

    assert_eq!(bus.ref_count(), 1);
    assert_eq!(sim.live_cameras(), 0);
    assert_eq!(sim.count(|op| *op == Op::SetTransmission(false)), 1);
    Ok(())
}

#[test]
fn same_camera_cannot_be_opened_twice() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(mono_camera(GUID_A));
    let bus = open_bus(&sim);

    let mut first = CameraSession::open(&bus, SessionConfig::new(), select::first())?;
    let err = CameraSession::open(&bus, SessionConfig::new(), select::first()).unwrap_err();

    assert!(matches!(err, CameraError::DeviceBusy { guid: GUID_A }));
    assert_eq!(sim.count(|op| matches!(op, Op::CameraNew(_))), 1);
    assert!(first.read().is_ok());

    first.close();
    let again = CameraSession::open(&bus, SessionConfig::new(), select::first())?;
    assert!(again.is_open());
    Ok(())
}

#[test]
fn two_cameras_stream_concurrently() -> anyhow::Result<()> {
    let sim = SimulatedBus::new()
        .with_camera(mono_camera(GUID_A))
        .with_camera(mono_camera(GUID_B));
    let bus = open_bus(&sim);
    let (a, b) = (CameraId::new(GUID_A), CameraId::new(GUID_B));

    let mut first = CameraSession::open(&bus, SessionConfig::new().node(0), select::first())?;
    let mut second = CameraSession::open(&bus, SessionConfig::new().node(1), select::first())?;

    assert_eq!(bus.ref_count(), 3);
    assert!(bus.get()?.is_claimed(a));
    assert!(bus.get()?.is_claimed(b));
    assert_eq!(first.camera_id(), a);
    assert_eq!(second.camera_id(), b);

    for _ in 0..3 {
        assert_eq!(first.read()?.width, 640);
        assert_eq!(second.read()?.width, 640);
    }
    assert_eq!(sim.live_cameras(), 2);

    first.close();
    assert_eq!(bus.ref_count(), 2);
    assert!(!bus.get()?.is_claimed(a));
    assert!(bus.get()?.is_claimed(b));
    assert!(second.read().is_ok());

    second.close();
    assert_eq!(bus.ref_count(), 1);
    assert!(!bus.get()?.is_claimed(b));
    assert_eq!(sim.live_cameras(), 0);
    Ok(())
}

#[test]
fn best_quality_prefers_color() -> anyhow::Result<()> {
    let sim = SimulatedBus::new().with_camera(
        SimCamera::new(GUID_A)
            .mode(VideoMode::Mode1024x768Mono8, &[FrameRate::F15])
            .mode(VideoMode::Mode640x480Rgb8, &[FrameRate::F15])
            .mode(VideoMode::Mode640x480Yuv411, &[FrameRate::F30]),
    );
    let bus = open_bus(&sim);

    let cam = CameraSession::open(&bus, SessionConfig::new(), select::best_quality())?;

    assert_eq!(cam.pixel_format(), PixelFormat::Rgb8);
    assert_eq!(cam.video_mode(), VideoMode::Mode640x480Rgb8);
    Ok(())
}
