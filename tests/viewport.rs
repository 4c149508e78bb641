use std::f32::consts::FRAC_PI_4;
use std::rc::Rc;
use std::time::{Duration, Instant};

use glam::Vec2;
use vr_orbit::gate::{ActivationPipeline, NoPlatform, SessionEntry, StepOutcome};
use vr_orbit::navigator::AnnotationOptions;
use vr_orbit::{
    ControlsConfig, ControlsError, PanDirection, Projection, SyntheticSensorBus, VrControls,
};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() < eps
}

#[test]
fn config_file_drives_half_view() {
    let config = ControlsConfig::parse(
        r#"{ "projection": "180_MONO", "speed": 2, "pan_period_ms": 20 }"#,
        std::path::Path::new("inline.json"),
    )
    .expect("config parses");
    assert_eq!(config.projection, Projection::Half180Mono);

    let t0 = Instant::now();
    let mut vr = VrControls::from_config(&config);
    vr.pan_start(PanDirection::Left, t0);
    // 20 ms period: 100 ticks in two seconds of 16 ms frames, well past the clamp
    for frame in 1..=125u64 {
        vr.update(t0 + Duration::from_millis(16 * frame))
            .expect("live controls");
    }
    assert!(approx_eq(vr.orbit().azimuthal_angle(), FRAC_PI_4, 1e-4));
}

#[test]
fn sensor_pad_and_drag_share_one_camera() {
    let t0 = Instant::now();
    let bus = SyntheticSensorBus::shared();
    let mut vr = VrControls::from_config(&ControlsConfig::default());
    vr.set_viewport_height(600.0);
    vr.enable_orientation(bus.clone());

    // seed the sensor baseline; nothing else pending, so the camera holds
    bus.borrow_mut().emit_orientation(30.0, 90.0, 1.0);
    assert!(!vr.update(t0).expect("live"));

    // a drag and a pan tick in the same frame
    vr.pointer_down(Vec2::new(300.0, 300.0));
    vr.pointer_move(Vec2::new(310.0, 300.0));
    vr.pointer_up();
    vr.pan_start(PanDirection::Right, t0);
    assert!(vr.update(t0 + Duration::from_millis(10)).expect("live"));
    vr.pan_end();

    let expected = -(std::f32::consts::TAU * 10.0 / 600.0) - 1f32.to_radians();
    assert!(approx_eq(vr.orbit().azimuthal_angle(), expected, 1e-4));

    // sensor turn adds on top instead of overwriting
    let before = vr.orbit().azimuthal_angle();
    bus.borrow_mut().emit_orientation(31.0, 90.0, 1.0);
    assert!(vr.update(t0 + Duration::from_millis(20)).expect("live"));
    assert!(!approx_eq(vr.orbit().azimuthal_angle(), before, 1e-3));
}

#[test]
fn half_view_clamp_holds_for_full_compass_sweep() {
    let config = ControlsConfig {
        projection: Projection::Half180,
        ..ControlsConfig::default()
    };
    let t0 = Instant::now();
    let bus = SyntheticSensorBus::shared();
    let mut vr = VrControls::from_config(&config);
    assert!(vr.enable_orientation(bus.clone()));

    // two full turns of the device, crossing the ±180° seam both ways
    let mut alpha = 1.0f32;
    for frame in 0..200u64 {
        alpha = if frame < 100 { alpha + 7.3 } else { alpha - 7.3 };
        bus.borrow_mut()
            .emit_orientation(alpha.rem_euclid(360.0).max(0.5), 90.0, 1.0);
        vr.update(t0 + Duration::from_millis(16 * frame))
            .expect("live");
        let azimuth = vr.orbit().azimuthal_angle();
        assert!(azimuth.abs() <= FRAC_PI_4 + 1e-5, "frame {frame}: {azimuth}");
    }
}

#[test]
fn annotations_through_facade() {
    let mut vr = VrControls::from_config(&ControlsConfig::default());
    let a = vr
        .add_annotation(2048.0, 0.0, AnnotationOptions::default())
        .clone();
    assert!(approx_eq(a.angle_deg, 180.0, 1e-4));
    assert!(approx_eq(a.position.y, 51.0 + 18.0, 1e-3));
    vr.clear_annotations();
    assert!(vr.navigator().annotations().is_empty());
}

#[test]
fn disposed_controls_refuse_frames() {
    let bus = SyntheticSensorBus::shared();
    let mut vr = VrControls::from_config(&ControlsConfig::default());
    vr.enable_orientation(bus.clone());
    vr.dispose();
    vr.dispose();
    assert!(vr.is_disposed());
    assert_eq!(bus.borrow().listener_count(), 0);
    assert!(matches!(vr.update(Instant::now()), Err(ControlsError::Disposed)));
}

#[test]
fn play_gate_without_platform_apis_plays() {
    let played = Rc::new(std::cell::Cell::new(0));
    let p = played.clone();
    let mut pipeline =
        ActivationPipeline::vr_play(&NoPlatform, SessionEntry::Request, move || p.set(p.get() + 1));
    let report = pollster::block_on(pipeline.run());
    assert_eq!(played.get(), 1);
    assert_eq!(report.outcome("default-action"), Some(&StepOutcome::Completed));
}
