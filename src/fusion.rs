// fusion.rs — feeds device orientation into the orbit controller as deltas
//
// The orientation source reports absolute quaternions while the orbit
// accumulates yaw/pitch deltas; writing both straight to the camera makes each
// overwrite the other. Instead every frame the change in extracted angle is
// queued on the orbit before it commits, so sensor and manual input add up.

use crate::angle::OrientationAngle;
use crate::device_orientation::{DeviceOrientationSource, OrientationProvider, OrientationUpdate};
use crate::error::ControlsError;
use crate::orbit::{OrbitController, RotateCamera};
use crate::sensor::SensorBus;

/// Default sensor speed; also used (negated) as the orbit key rotation speed.
pub const DEFAULT_SPEED: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct OrientationFusion {
    speed: f32,
    last_angle: Option<OrientationAngle>,
    generation: Option<u64>,
}

impl OrientationFusion {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            last_angle: None,
            generation: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn last_angle(&self) -> Option<OrientationAngle> {
        self.last_angle
    }

    /// Forgets the baseline; the next usable reading only re-seeds it.
    pub fn reset(&mut self) {
        self.last_angle = None;
    }

    /// Runs one sensor step and queues the angular change on `camera`.
    ///
    /// Returns true if rotation was queued. Unusable readings leave the
    /// baseline alone; the first usable one after a (re)connect only seeds it.
    pub fn apply<P, C>(&mut self, source: &mut P, camera: &mut C) -> bool
    where
        P: OrientationProvider + ?Sized,
        C: RotateCamera + ?Sized,
    {
        let status = source.update();
        if !status.is_usable() {
            return false;
        }

        let generation = source.generation();
        if self.generation != Some(generation) {
            self.generation = Some(generation);
            self.last_angle = None;
        }

        let current = OrientationAngle::from_quat(source.quaternion());
        let Some(last) = self.last_angle.replace(current) else {
            return false;
        };
        if status != OrientationUpdate::Changed {
            return false;
        }

        let scale = 1.0 + self.speed;
        camera.rotate_left((last.yaw - current.yaw) * scale);
        camera.rotate_up((last.pitch - current.pitch) * scale);
        true
    }
}

/// Orbit camera with optional device-orientation input layered on top.
pub struct OrbitOrientationControls {
    pub orbit: OrbitController,
    orientation: Option<Box<dyn OrientationProvider>>,
    fusion: OrientationFusion,
}

impl OrbitOrientationControls {
    pub fn new(speed: f32, half_view: bool) -> Self {
        Self::with_orbit(OrbitController::panorama(speed, half_view), speed)
    }

    pub fn with_orbit(orbit: OrbitController, speed: f32) -> Self {
        Self {
            orbit,
            orientation: None,
            fusion: OrientationFusion::new(speed),
        }
    }

    /// Connects a [`DeviceOrientationSource`] on `bus`. Replaces any
    /// previous source.
    pub fn enable_orientation(&mut self, bus: impl SensorBus + 'static) {
        let mut source = DeviceOrientationSource::new(bus);
        source.connect();
        self.set_orientation_provider(Box::new(source));
    }

    pub fn set_orientation_provider(&mut self, provider: Box<dyn OrientationProvider>) {
        if let Some(mut old) = self.orientation.take() {
            old.dispose();
        }
        self.fusion.reset();
        self.orientation = Some(provider);
    }

    /// Disconnects and drops the orientation source, if any.
    pub fn disable_orientation(&mut self) {
        if let Some(mut source) = self.orientation.take() {
            source.dispose();
        }
        self.fusion.reset();
    }

    pub fn has_orientation(&self) -> bool {
        self.orientation.is_some()
    }

    pub fn fusion(&self) -> &OrientationFusion {
        &self.fusion
    }

    /// Advances one frame: sensor delta first, then the orbit commit.
    pub fn update(&mut self) -> Result<bool, ControlsError> {
        if self.orbit.is_disposed() {
            return Err(ControlsError::Disposed);
        }
        if let Some(source) = self.orientation.as_deref_mut() {
            self.fusion.apply(source, &mut self.orbit);
        }
        self.orbit.update()
    }

    /// Disconnects the sensor, then releases the orbit. Safe to repeat.
    pub fn dispose(&mut self) {
        if let Some(mut source) = self.orientation.take() {
            source.dispose();
        }
        self.orbit.dispose();
    }
}
