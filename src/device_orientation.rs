// device_orientation.rs — gyroscope readings as a camera quaternion

use crate::sensor::{DeviceOrientationReading, SensorBus, SensorEvent, SensorEventKind, Subscription};
use glam::{EulerRot, Quat, Vec3};
use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

/// Below this the new quaternion counts as the same as the last committed one.
const CHANGE_EPS: f32 = 0.000001;

/// Result of one [`OrientationProvider::update`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationUpdate {
    /// Source is disconnected.
    Disabled,
    /// No sample has arrived yet (or the platform has no sensor).
    NoReading,
    /// Latest sample has a zero or missing axis and was dropped.
    Degenerate,
    /// Sample processed, rotation moved less than the noise threshold.
    Unchanged,
    /// Sample processed and committed as the new quaternion.
    Changed,
}

impl OrientationUpdate {
    /// True when a non-degenerate reading was processed this frame.
    pub fn is_usable(self) -> bool {
        matches!(self, OrientationUpdate::Unchanged | OrientationUpdate::Changed)
    }
}

/// Anything that can hand the fusion layer an absolute orientation each frame.
pub trait OrientationProvider {
    fn update(&mut self) -> OrientationUpdate;
    /// Last committed orientation.
    fn quaternion(&self) -> Quat;
    /// Bumped on every (re)connect so consumers can drop stale baselines.
    fn generation(&self) -> u64;
    /// Releases whatever the provider subscribed to.
    fn dispose(&mut self) {}
}

#[derive(Debug, Default)]
struct RawState {
    reading: Option<DeviceOrientationReading>,
    screen_orientation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeListener(u64);

/// Builds the camera quaternion for a device pose. All angles in radians.
///
/// The platform reports intrinsic Z-X'-Y'' angles; composed here in Y-X-Z order
/// with gamma negated to match the camera frame, then rotated so the camera
/// looks out of the back of the device rather than its top edge, then undone
/// by the screen rotation.
pub fn device_quaternion(alpha: f32, beta: f32, gamma: f32, screen: f32) -> Quat {
    let device = Quat::from_euler(EulerRot::YXZ, alpha, beta, -gamma);
    let look_out_back = Quat::from_rotation_x(-FRAC_PI_2);
    let screen_adjust = Quat::from_axis_angle(Vec3::Z, -screen);
    device * look_out_back * screen_adjust
}

pub struct DeviceOrientationSource {
    bus: Box<dyn SensorBus>,
    state: Rc<RefCell<RawState>>,
    subscriptions: Vec<Subscription>,
    enabled: bool,
    generation: u64,
    /// Radians added to alpha, used to re-centre the compass heading.
    pub alpha_offset: f32,
    quaternion: Quat,
    listeners: Vec<(ChangeListener, Box<dyn FnMut(Quat)>)>,
    next_listener: u64,
}

impl DeviceOrientationSource {
    /// Wraps `bus` without subscribing; call [`connect`](Self::connect) next.
    pub fn new(bus: impl SensorBus + 'static) -> Self {
        Self {
            bus: Box::new(bus),
            state: Rc::new(RefCell::new(RawState::default())),
            subscriptions: Vec::new(),
            enabled: false,
            generation: 0,
            alpha_offset: 0.0,
            quaternion: Quat::IDENTITY,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Subscribes to orientation and screen-rotation events. No-op when
    /// already connected.
    pub fn connect(&mut self) {
        if self.is_connected() {
            return;
        }

        self.state.borrow_mut().screen_orientation = self.bus.screen_orientation();

        let state = self.state.clone();
        let orientation = self.bus.subscribe(
            SensorEventKind::DeviceOrientation,
            Box::new(move |event| {
                if let SensorEvent::DeviceOrientation(reading) = event {
                    state.borrow_mut().reading = Some(*reading);
                }
            }),
        );

        let state = self.state.clone();
        let screen = self.bus.subscribe(
            SensorEventKind::ScreenOrientation,
            Box::new(move |event| {
                if let SensorEvent::ScreenOrientation(deg) = event {
                    state.borrow_mut().screen_orientation = *deg;
                }
            }),
        );

        self.subscriptions = vec![orientation, screen];
        self.enabled = true;
        self.generation += 1;
        log::debug!("device orientation connected (generation {})", self.generation);
    }

    /// Releases both subscriptions and disables the source. Safe to repeat.
    pub fn disconnect(&mut self) {
        for sub in self.subscriptions.drain(..) {
            self.bus.unsubscribe(sub);
        }
        if self.enabled {
            log::debug!("device orientation disconnected");
        }
        self.enabled = false;
        self.state.borrow_mut().reading = None;
    }

    /// Registers `f` to run once per update that commits a new quaternion.
    pub fn on_change(&mut self, f: impl FnMut(Quat) + 'static) -> ChangeListener {
        let id = ChangeListener(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(f)));
        id
    }

    pub fn remove_listener(&mut self, id: ChangeListener) {
        self.listeners.retain(|(l, _)| *l != id);
    }

    /// Latest raw reading, if any arrived since connecting.
    pub fn reading(&self) -> Option<DeviceOrientationReading> {
        self.state.borrow().reading
    }
}

impl OrientationProvider for DeviceOrientationSource {
    fn update(&mut self) -> OrientationUpdate {
        if !self.enabled {
            return OrientationUpdate::Disabled;
        }

        let (reading, screen) = {
            let state = self.state.borrow();
            (state.reading, state.screen_orientation)
        };
        let Some(reading) = reading else {
            return OrientationUpdate::NoReading;
        };
        let (Some(alpha), Some(beta), Some(gamma)) = (reading.alpha, reading.beta, reading.gamma)
        else {
            return OrientationUpdate::Degenerate;
        };
        if !reading.is_usable() {
            return OrientationUpdate::Degenerate;
        }

        let q = device_quaternion(
            alpha.to_radians() + self.alpha_offset,
            beta.to_radians(),
            gamma.to_radians(),
            screen.to_radians(),
        );

        if q == self.quaternion || 8.0 * (1.0 - self.quaternion.dot(q)) <= CHANGE_EPS {
            return OrientationUpdate::Unchanged;
        }

        self.quaternion = q;
        for (_, f) in self.listeners.iter_mut() {
            f(q);
        }
        OrientationUpdate::Changed
    }

    fn quaternion(&self) -> Quat {
        self.quaternion
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn dispose(&mut self) {
        self.disconnect();
    }
}

impl Drop for DeviceOrientationSource {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SyntheticSensorBus;

    fn connected() -> (Rc<RefCell<SyntheticSensorBus>>, DeviceOrientationSource) {
        let bus = SyntheticSensorBus::shared();
        let mut source = DeviceOrientationSource::new(bus.clone());
        source.connect();
        (bus, source)
    }

    #[test]
    fn no_events_means_no_reading() {
        let (_bus, mut source) = connected();
        assert_eq!(source.update(), OrientationUpdate::NoReading);
        assert_eq!(source.quaternion(), Quat::IDENTITY);
    }

    #[test]
    fn unconnected_source_is_disabled() {
        let mut source = DeviceOrientationSource::new(SyntheticSensorBus::new());
        assert_eq!(source.update(), OrientationUpdate::Disabled);
    }

    #[test]
    fn connect_is_idempotent() {
        let (bus, mut source) = connected();
        source.connect();
        source.connect();
        assert_eq!(bus.borrow().listener_count(), 2);
        assert_eq!(source.generation(), 1);
    }

    #[test]
    fn degenerate_reading_is_dropped() {
        let (bus, mut source) = connected();
        bus.borrow_mut().emit_orientation(0.0, 45.0, 10.0);
        assert_eq!(source.update(), OrientationUpdate::Degenerate);
        assert_eq!(source.quaternion(), Quat::IDENTITY);
    }

    #[test]
    fn change_fires_once_then_settles() {
        let (bus, mut source) = connected();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        source.on_change(move |_| *h.borrow_mut() += 1);

        bus.borrow_mut().emit_orientation(30.0, 60.0, 5.0);
        assert_eq!(source.update(), OrientationUpdate::Changed);
        assert_eq!(source.update(), OrientationUpdate::Unchanged);
        assert_eq!(*hits.borrow(), 1);

        bus.borrow_mut().emit_orientation(31.0, 60.0, 5.0);
        assert_eq!(source.update(), OrientationUpdate::Changed);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let (bus, mut source) = connected();
        let kept = Rc::new(RefCell::new(0));
        let dropped = Rc::new(RefCell::new(0));
        let k = kept.clone();
        let d = dropped.clone();
        source.on_change(move |_| *k.borrow_mut() += 1);
        let id = source.on_change(move |_| *d.borrow_mut() += 1);

        bus.borrow_mut().emit_orientation(30.0, 60.0, 5.0);
        source.update();
        source.remove_listener(id);
        bus.borrow_mut().emit_orientation(40.0, 60.0, 5.0);
        source.update();

        assert_eq!(*kept.borrow(), 2);
        assert_eq!(*dropped.borrow(), 1);
    }

    #[test]
    fn committed_quaternion_matches_composition() {
        let (bus, mut source) = connected();
        bus.borrow_mut().emit_orientation(90.0, 45.0, 10.0);
        source.update();
        let expected = device_quaternion(
            90f32.to_radians(),
            45f32.to_radians(),
            10f32.to_radians(),
            0.0,
        );
        assert!(source.quaternion().abs_diff_eq(expected, 1e-6));
        assert!(source.quaternion().is_normalized());
    }

    #[test]
    fn screen_rotation_rolls_about_view_axis() {
        let (bus, mut source) = connected();
        bus.borrow_mut().emit_orientation(20.0, 70.0, 15.0);
        source.update();
        let upright = source.quaternion();

        bus.borrow_mut().emit(SensorEvent::ScreenOrientation(90.0));
        assert_eq!(source.update(), OrientationUpdate::Changed);
        let rotated = source.quaternion();

        // Forward (-Z in camera space) is unchanged by a roll about Z.
        let f0 = upright * Vec3::NEG_Z;
        let f1 = rotated * Vec3::NEG_Z;
        assert!((f0 - f1).length() < 1e-5);
        assert!(!upright.abs_diff_eq(rotated, 1e-3));
    }

    #[test]
    fn upright_device_looks_at_horizon() {
        // beta = 90 holds the phone vertical; the camera should look level.
        let q = device_quaternion(0.0, FRAC_PI_2, 0.0, 0.0);
        let forward = q * Vec3::NEG_Z;
        assert!(forward.y.abs() < 1e-5);
    }

    #[test]
    fn disconnect_unsubscribes_and_disables() {
        let (bus, mut source) = connected();
        bus.borrow_mut().emit_orientation(30.0, 60.0, 5.0);
        source.disconnect();
        assert_eq!(bus.borrow().listener_count(), 0);
        assert!(!source.is_enabled());
        assert_eq!(source.update(), OrientationUpdate::Disabled);
        source.dispose();
        source.dispose();
        assert_eq!(bus.borrow().listener_count(), 0);
    }

    #[test]
    fn drop_releases_subscriptions() {
        let bus = SyntheticSensorBus::shared();
        {
            let mut source = DeviceOrientationSource::new(bus.clone());
            source.connect();
            assert_eq!(bus.borrow().listener_count(), 2);
        }
        assert_eq!(bus.borrow().listener_count(), 0);
    }

    #[test]
    fn reconnect_bumps_generation() {
        let (_bus, mut source) = connected();
        source.disconnect();
        source.connect();
        assert_eq!(source.generation(), 2);
        assert_eq!(source.update(), OrientationUpdate::NoReading);
    }
}
