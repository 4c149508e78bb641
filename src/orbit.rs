// orbit.rs — angle-accumulating orbit camera, the only writer of the camera transform

use crate::error::ControlsError;
use glam::{Mat3, Quat, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_4, PI, TAU};

const EPS: f32 = 0.000001;

/// Low-level rotation primitives every input path goes through.
pub trait RotateCamera {
    /// Queues a rotation around the vertical axis.
    fn rotate_left(&mut self, angle: f32);
    /// Queues a rotation towards/away from the poles.
    fn rotate_up(&mut self, angle: f32);
}

/// Where the camera is and where it looks. `rotation * -Z` is forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl CameraTransform {
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Yaw/pitch of the view direction in degrees, for status display.
    pub fn yaw_pitch_degrees(&self) -> (f32, f32) {
        let f = self.forward();
        let yaw = (-f.x).atan2(-f.z).to_degrees();
        let pitch = f.y.clamp(-1.0, 1.0).asin().to_degrees();
        (yaw, pitch)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn set_from_vec3(&mut self, v: Vec3) {
        self.radius = v.length();
        if self.radius == 0.0 {
            self.theta = 0.0;
            self.phi = 0.0;
        } else {
            self.theta = v.x.atan2(v.z);
            self.phi = (v.y / self.radius).clamp(-1.0, 1.0).acos();
        }
    }

    fn to_vec3(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.radius * self.phi.cos(),
            sin_phi_radius * self.theta.cos(),
        )
    }

    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Arrow keys the orbit reacts to. Rotation only happens with a modifier held;
/// plain arrows are left to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Tuning for [`OrbitController`]. There is no zoom or pan: the camera only
/// turns in place.
#[derive(Debug, Clone, Copy)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub key_rotate_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_azimuth_angle: f32,
    pub max_azimuth_angle: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            key_rotate_speed: 1.0,
            enable_damping: false,
            damping_factor: 0.05,
            min_azimuth_angle: f32::NEG_INFINITY,
            max_azimuth_angle: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }
}

impl OrbitSettings {
    /// Orientation-only navigation for a camera sitting inside a projected
    /// sphere. `half_view` keeps the unrendered back hemisphere out of sight.
    pub fn panorama(speed: f32, half_view: bool) -> Self {
        let mut s = Self {
            key_rotate_speed: -speed,
            ..Self::default()
        };
        if half_view {
            s.min_azimuth_angle = -FRAC_PI_4;
            s.max_azimuth_angle = FRAC_PI_4;
        }
        s
    }
}

pub struct OrbitController {
    pub settings: OrbitSettings,
    target: Vec3,
    transform: CameraTransform,
    /// Pose as of the last `update` that reported a change.
    last_reported: CameraTransform,
    spherical: Spherical,
    spherical_delta: Spherical,
    drag_from: Option<Vec2>,
    viewport_height: f32,
    disposed: bool,
}

impl OrbitController {
    pub fn new(transform: CameraTransform, target: Vec3, settings: OrbitSettings) -> Self {
        let mut spherical = Spherical::default();
        spherical.set_from_vec3(transform.position - target);
        Self {
            settings,
            target,
            transform,
            last_reported: transform,
            spherical,
            spherical_delta: Spherical::default(),
            drag_from: None,
            viewport_height: 1.0,
            disposed: false,
        }
    }

    /// Camera at the origin looking one unit down -Z.
    pub fn panorama(speed: f32, half_view: bool) -> Self {
        Self::new(
            CameraTransform::default(),
            Vec3::new(0.0, 0.0, -1.0),
            OrbitSettings::panorama(speed, half_view),
        )
    }

    pub fn transform(&self) -> CameraTransform {
        self.transform
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Current azimuth (theta) in radians, as of the last `update`.
    pub fn azimuthal_angle(&self) -> f32 {
        self.spherical.theta
    }

    /// Current polar angle (phi) in radians, as of the last `update`.
    pub fn polar_angle(&self) -> f32 {
        self.spherical.phi
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Height of the element receiving pointer and key input, in pixels.
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        if self.disposed {
            return;
        }
        self.drag_from = Some(position);
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        let Some(from) = self.drag_from else {
            return;
        };
        let delta = (position - from) * self.settings.rotate_speed;
        let h = self.viewport_height;
        self.rotate_left(TAU * delta.x / h);
        self.rotate_up(TAU * delta.y / h);
        self.drag_from = Some(position);
    }

    pub fn pointer_up(&mut self) {
        self.drag_from = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Handles a key press on the viewport container. Returns true if the key
    /// rotated the camera.
    pub fn key_down(&mut self, key: &str, modifier: bool) -> bool {
        if self.disposed || !modifier {
            return false;
        }
        let Some(arrow) = ArrowKey::from_key(key) else {
            return false;
        };
        let step = TAU * self.settings.key_rotate_speed / self.viewport_height;
        match arrow {
            ArrowKey::Up => self.rotate_up(step),
            ArrowKey::Down => self.rotate_up(-step),
            ArrowKey::Left => self.rotate_left(step),
            ArrowKey::Right => self.rotate_left(-step),
        }
        true
    }

    /// Commits pending deltas to the camera transform. Returns whether the
    /// camera moved.
    pub fn update(&mut self) -> Result<bool, ControlsError> {
        if self.disposed {
            return Err(ControlsError::Disposed);
        }
        let s = &self.settings;

        let offset = self.transform.position - self.target;
        self.spherical.set_from_vec3(offset);

        if s.enable_damping {
            self.spherical.theta += self.spherical_delta.theta * s.damping_factor;
            self.spherical.phi += self.spherical_delta.phi * s.damping_factor;
        } else {
            self.spherical.theta += self.spherical_delta.theta;
            self.spherical.phi += self.spherical_delta.phi;
        }

        self.spherical.theta =
            clamp_azimuth(self.spherical.theta, s.min_azimuth_angle, s.max_azimuth_angle);
        self.spherical.phi = self
            .spherical
            .phi
            .clamp(s.min_polar_angle, s.max_polar_angle);
        self.spherical.make_safe();

        let position = self.target + self.spherical.to_vec3();
        let rotation = look_at(position, self.target, Vec3::Y);

        if s.enable_damping {
            self.spherical_delta.theta *= 1.0 - s.damping_factor;
            self.spherical_delta.phi *= 1.0 - s.damping_factor;
        } else {
            self.spherical_delta.theta = 0.0;
            self.spherical_delta.phi = 0.0;
        }

        // Rotation follows from position: the camera always faces the target.
        // Measured against the last reported pose so slow drift still adds up.
        let moved = (position - self.last_reported.position).length_squared() > EPS;

        self.transform = CameraTransform { position, rotation };
        if moved {
            self.last_reported = self.transform;
        }
        Ok(moved)
    }

    /// Drops pending input and stops accepting more. Further `update` calls
    /// report [`ControlsError::Disposed`].
    pub fn dispose(&mut self) {
        self.drag_from = None;
        self.spherical_delta = Spherical::default();
        self.disposed = true;
    }
}

impl RotateCamera for OrbitController {
    fn rotate_left(&mut self, angle: f32) {
        if !self.disposed {
            self.spherical_delta.theta -= angle;
        }
    }

    fn rotate_up(&mut self, angle: f32) {
        if !self.disposed {
            self.spherical_delta.phi -= angle;
        }
    }
}

/// Clamps `theta` into `[min, max]`, treating both bounds as angles that may
/// wrap through ±π.
fn clamp_azimuth(theta: f32, mut min: f32, mut max: f32) -> f32 {
    if !(min.is_finite() && max.is_finite()) {
        return theta;
    }

    if min < -PI {
        min += TAU;
    } else if min > PI {
        min -= TAU;
    }
    if max < -PI {
        max += TAU;
    } else if max > PI {
        max -= TAU;
    }

    if min <= max {
        theta.clamp(min, max)
    } else if theta > (min + max) / 2.0 {
        theta.max(min)
    } else {
        theta.min(max)
    }
}

/// Rotation that points a camera at `eye` towards `target`.
fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let back = (eye - target).normalize();
    let right = up.cross(back).normalize();
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}
