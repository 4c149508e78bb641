// controls.rs — everything a player attaches to one viewport
//
// Frame order: due pan ticks, then sensor delta, then the orbit commit, then
// the navigator slice catches up with the new azimuth.

use crate::config::ControlsConfig;
use crate::device_orientation::OrientationProvider;
use crate::error::ControlsError;
use crate::fusion::OrbitOrientationControls;
use crate::gate::CapabilityFlags;
use crate::navigator::{Annotation, AnnotationOptions, Navigator};
use crate::orbit::{CameraTransform, OrbitController};
use crate::pan::PanDirection;
use crate::projection::Projection;
use crate::sensor::SensorBus;
use glam::Vec2;
use std::path::Path;
use std::time::Instant;

pub struct VrControls {
    controls: OrbitOrientationControls,
    navigator: Navigator,
    projection: Projection,
    /// Cleared once motion permission is refused; stays off for the session.
    orientation_allowed: bool,
    disposed: bool,
}

impl VrControls {
    pub fn from_config(config: &ControlsConfig) -> Self {
        let orbit = OrbitController::new(
            CameraTransform::default(),
            glam::Vec3::new(0.0, 0.0, -1.0),
            config.orbit_settings(),
        );
        let navigator = Navigator::new(config.navigator, config.pan_controller());
        log::debug!(
            "controls for {} (half view: {})",
            config.projection,
            config.half_view()
        );
        Self {
            controls: OrbitOrientationControls::with_orbit(orbit, config.speed),
            navigator,
            projection: config.projection,
            orientation_allowed: true,
            disposed: false,
        }
    }

    /// Builds controls from a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ControlsError> {
        let config = ControlsConfig::load(path)?;
        Ok(Self::from_config(&config))
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.controls.orbit
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn transform(&self) -> CameraTransform {
        self.controls.orbit.transform()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn has_orientation(&self) -> bool {
        self.controls.has_orientation()
    }

    /// Starts reading device orientation from `bus`. Returns false when the
    /// controls are disposed or motion permission was refused.
    pub fn enable_orientation(&mut self, bus: impl SensorBus + 'static) -> bool {
        if self.disposed || !self.orientation_allowed {
            return false;
        }
        self.controls.enable_orientation(bus);
        true
    }

    pub fn set_orientation_provider(&mut self, provider: Box<dyn OrientationProvider>) -> bool {
        if self.disposed || !self.orientation_allowed {
            return false;
        }
        self.controls.set_orientation_provider(provider);
        true
    }

    /// Applies the activation gate's outcome. A refused motion permission
    /// disconnects any sensor and keeps orientation off from then on.
    pub fn apply_capabilities(&mut self, flags: CapabilityFlags) {
        if flags.motion_permission == Some(false) && self.orientation_allowed {
            self.orientation_allowed = false;
            if self.controls.has_orientation() {
                log::info!("motion permission refused; device orientation off");
            }
            self.controls.disable_orientation();
        }
    }

    pub fn orientation_allowed(&self) -> bool {
        self.orientation_allowed
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.controls.orbit.set_viewport_height(height);
    }

    // viewport drag

    pub fn pointer_down(&mut self, position: Vec2) {
        self.controls.orbit.pointer_down(position);
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.controls.orbit.pointer_move(position);
    }

    pub fn pointer_up(&mut self) {
        self.controls.orbit.pointer_up();
    }

    /// WASD goes to the navigator pad, modified arrows to the orbit.
    pub fn key_down(&mut self, key: &str, modifier: bool, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        self.navigator.key_down(key, now) || self.controls.orbit.key_down(key, modifier)
    }

    pub fn key_up(&mut self, key: &str, now: Instant) -> bool {
        self.navigator.key_up(key, now)
    }

    // navigator pad

    pub fn pad_pointer_down(&mut self, position: Vec2, now: Instant) -> bool {
        !self.disposed && self.navigator.pointer_down(position, now)
    }

    pub fn pad_pointer_up(&mut self, now: Instant) {
        self.navigator.pointer_up(now);
    }

    pub fn pad_pointer_leave(&mut self, now: Instant) {
        self.navigator.pointer_leave(now);
    }

    pub fn pad_touch_start(&mut self, direction: PanDirection, now: Instant) {
        if !self.disposed {
            self.navigator.touch_start(direction, now);
        }
    }

    pub fn pad_touch_end(&mut self, now: Instant) {
        self.navigator.touch_end(now);
    }

    pub fn pan_start(&mut self, direction: PanDirection, now: Instant) {
        if !self.disposed {
            self.navigator.pan_start(direction, now);
        }
    }

    pub fn pan_end(&mut self) {
        self.navigator.pan_end();
    }

    pub fn add_annotation(&mut self, x: f32, y: f32, options: AnnotationOptions) -> &Annotation {
        self.navigator.add_annotation(x, y, options)
    }

    pub fn clear_annotations(&mut self) {
        self.navigator.clear_annotations();
    }

    /// Runs one frame at `now`. Returns whether the camera moved.
    pub fn update(&mut self, now: Instant) -> Result<bool, ControlsError> {
        if self.disposed {
            return Err(ControlsError::Disposed);
        }
        self.navigator.advance(now, &mut self.controls.orbit);
        let moved = self.controls.update()?;
        if moved {
            self.navigator
                .sync_azimuth(self.controls.orbit.azimuthal_angle());
        }
        Ok(moved)
    }

    /// Stops panning and the sensor before releasing the orbit. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.navigator.dispose();
        self.controls.dispose();
        self.disposed = true;
        log::debug!("controls disposed");
    }
}

impl Drop for VrControls {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::RotateCamera;
    use crate::sensor::SyntheticSensorBus;
    use std::f32::consts::FRAC_PI_4;
    use std::time::Duration;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Steps frames of `frame` length from `t0` up to `t0 + total`.
    fn run_frames(vr: &mut VrControls, t0: Instant, total: Duration, frame: Duration) -> bool {
        let mut at = Duration::ZERO;
        let mut moved = false;
        while at < total {
            at = (at + frame).min(total);
            moved |= vr.update(t0 + at).unwrap();
        }
        moved
    }

    #[test]
    fn half_view_pan_stops_at_quarter_turn() {
        let config = ControlsConfig {
            projection: Projection::Half180,
            ..ControlsConfig::default()
        };
        let t0 = Instant::now();
        let mut vr = VrControls::from_config(&config);

        vr.pan_start(PanDirection::Right, t0);
        assert!(run_frames(&mut vr, t0, Duration::from_secs(1), Duration::from_millis(16)));
        assert!(approx_eq(vr.orbit().azimuthal_angle(), -FRAC_PI_4));
        assert!(approx_eq(vr.navigator().slice_rotation_deg(), 90.0));
    }

    #[test]
    fn full_view_pan_accumulates() {
        let t0 = Instant::now();
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        assert!(vr.key_down("a", false, t0));
        run_frames(&mut vr, t0, Duration::from_millis(200), Duration::from_millis(20));
        vr.key_up("a", t0 + Duration::from_millis(200));
        // 20 ticks of one degree to the left
        assert!(approx_eq(vr.orbit().azimuthal_angle(), 20f32.to_radians()));
        assert!(approx_eq(vr.navigator().slice_rotation_deg(), 25.0));
    }

    #[test]
    fn arrows_need_modifier() {
        let t0 = Instant::now();
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        assert!(!vr.key_down("ArrowLeft", false, t0));
        assert!(vr.key_down("ArrowLeft", true, t0));
        assert!(vr.update(t0).unwrap());
    }

    #[test]
    fn dispose_while_panning() {
        let t0 = Instant::now();
        let bus = SyntheticSensorBus::shared();
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        vr.enable_orientation(bus.clone());
        vr.pan_start(PanDirection::Up, t0);
        assert_eq!(vr.navigator().pan().active_timers(), 1);

        vr.dispose();
        assert_eq!(vr.navigator().pan().active_timers(), 0);
        assert_eq!(bus.borrow().listener_count(), 0);
        assert!(matches!(
            vr.update(t0 + Duration::from_secs(1)),
            Err(ControlsError::Disposed)
        ));

        vr.pan_start(PanDirection::Up, t0);
        assert_eq!(vr.navigator().pan().active_timers(), 0);
        vr.dispose();
    }

    #[test]
    fn slice_follows_slow_rotation() {
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        let t0 = Instant::now();
        for i in 0..200u64 {
            vr.controls.orbit.rotate_left(-0.0009);
            vr.update(t0 + Duration::from_millis(16 * i)).unwrap();
        }
        let expected = 45.0 - vr.orbit().azimuthal_angle().to_degrees();
        assert!((vr.navigator().slice_rotation_deg() - expected).abs() < 0.1);
        assert!(vr.navigator().slice_rotation_deg() < 36.0);
    }

    #[test]
    fn refused_permission_keeps_orientation_off() {
        let bus = SyntheticSensorBus::shared();
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        assert!(vr.enable_orientation(bus.clone()));
        assert_eq!(bus.borrow().listener_count(), 2);

        vr.apply_capabilities(CapabilityFlags {
            motion_permission: Some(false),
            immersive_supported: None,
        });
        assert!(!vr.orientation_allowed());
        assert!(!vr.has_orientation());
        assert_eq!(bus.borrow().listener_count(), 0);

        assert!(!vr.enable_orientation(bus.clone()));
        assert_eq!(bus.borrow().listener_count(), 0);

        // a later grant does not re-open a refused permission
        vr.apply_capabilities(CapabilityFlags {
            motion_permission: Some(true),
            immersive_supported: None,
        });
        assert!(!vr.enable_orientation(bus.clone()));
    }

    #[test]
    fn unresolved_permission_leaves_orientation_alone() {
        let bus = SyntheticSensorBus::shared();
        let mut vr = VrControls::from_config(&ControlsConfig::default());
        vr.apply_capabilities(CapabilityFlags::default());
        assert!(vr.enable_orientation(bus.clone()));
        assert!(vr.has_orientation());
    }

    #[test]
    fn unreadable_config_surfaces_as_controls_error() {
        let err = VrControls::load(Path::new("/no/such/controls.json")).err();
        assert!(matches!(
            err,
            Some(ControlsError::Config(crate::error::ConfigError::Io { .. }))
        ));
    }

    #[test]
    fn drop_releases_sensor() {
        let bus = SyntheticSensorBus::shared();
        {
            let mut vr = VrControls::from_config(&ControlsConfig::default());
            vr.enable_orientation(bus.clone());
            assert_eq!(bus.borrow().listener_count(), 2);
        }
        assert_eq!(bus.borrow().listener_count(), 0);
    }
}
