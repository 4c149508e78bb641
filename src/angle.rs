// angle.rs — quaternion to (pitch, roll, yaw) extraction

use glam::Quat;
use std::f32::consts::FRAC_PI_2;

/// Above this value of `x*y + z*w` the rotation is treated as sitting on a pole.
pub const POLE_THRESHOLD: f32 = 0.499;

/// Angles in radians extracted from an orientation quaternion.
///
/// Only meaningful for comparing one frame against the next; the fusion layer
/// keeps the previous extraction and feeds the difference to the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationAngle {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

impl OrientationAngle {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        roll: 0.0,
        yaw: 0.0,
    };

    pub fn from_quat(q: Quat) -> Self {
        quat_to_angle(q.x, q.y, q.z, q.w)
    }
}

/// Converts a unit quaternion into pitch/roll/yaw.
///
/// Near the poles (`test` beyond ±0.499) roll is pinned to zero and the whole
/// rotation is folded into yaw.
pub fn quat_to_angle(x: f32, y: f32, z: f32, w: f32) -> OrientationAngle {
    let test = x * y + z * w;

    // north pole
    if test > POLE_THRESHOLD {
        return OrientationAngle {
            pitch: FRAC_PI_2,
            roll: 0.0,
            yaw: 2.0 * x.atan2(w),
        };
    }

    // south pole
    if test < -POLE_THRESHOLD {
        return OrientationAngle {
            pitch: -FRAC_PI_2,
            roll: 0.0,
            yaw: -2.0 * x.atan2(w),
        };
    }

    let sqx = x * x;
    let sqy = y * y;
    let sqz = z * z;

    OrientationAngle {
        pitch: (2.0 * test).asin(),
        roll: (2.0 * x * w - 2.0 * y * z).atan2(1.0 - 2.0 * sqx - 2.0 * sqz),
        yaw: (2.0 * y * w - 2.0 * x * z).atan2(1.0 - 2.0 * sqy - 2.0 * sqz),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{EulerRot, Vec3};
    use std::f32::consts::PI;

    // asin(2 * 0.499) sits about 0.063 rad short of the pole, so that is the
    // largest step the extractor may take when it switches branches.
    const POLE_BAND: f32 = 0.08;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    /// Rebuilds the quaternion the extractor assumes: yaw about Y, then pitch
    /// about Z, then roll about X.
    fn compose(angle: OrientationAngle) -> Quat {
        Quat::from_euler(EulerRot::YZX, angle.yaw, angle.pitch, angle.roll)
    }

    #[test]
    fn identity_is_zero() {
        let a = OrientationAngle::from_quat(Quat::IDENTITY);
        assert_eq!(a, OrientationAngle::ZERO);
    }

    #[test]
    fn same_input_same_bits() {
        let q = Quat::from_euler(EulerRot::YXZ, 0.3, -0.7, 1.1);
        let a = quat_to_angle(q.x, q.y, q.z, q.w);
        for _ in 0..16 {
            let b = quat_to_angle(q.x, q.y, q.z, q.w);
            assert_eq!(a.pitch.to_bits(), b.pitch.to_bits());
            assert_eq!(a.roll.to_bits(), b.roll.to_bits());
            assert_eq!(a.yaw.to_bits(), b.yaw.to_bits());
        }
    }

    #[test]
    fn pure_yaw_round_trip() {
        for i in -17..=17 {
            let yaw = i as f32 * 0.18;
            let a = OrientationAngle::from_quat(Quat::from_rotation_y(yaw));
            assert!(approx_eq(a.yaw, yaw, 1e-5), "yaw {yaw} -> {a:?}");
            assert!(approx_eq(a.pitch, 0.0, 1e-5));
            assert!(approx_eq(a.roll, 0.0, 1e-5));
        }
    }

    #[test]
    fn sampled_round_trip_away_from_poles() {
        // Sweep a grid of angles that keeps |pitch| clear of the pole band.
        for yi in -6..=6 {
            for pi in -5..=5 {
                for ri in -6..=6 {
                    let expected = OrientationAngle {
                        yaw: yi as f32 * 0.5,
                        pitch: pi as f32 * 0.25,
                        roll: ri as f32 * 0.5,
                    };
                    let q = compose(expected);
                    let got = OrientationAngle::from_quat(q);
                    let back = compose(got);
                    // Compare rotations, not raw angles: the same rotation can be
                    // spelled more than one way.
                    let v = Vec3::new(0.3, -0.4, 0.8);
                    assert!(
                        (q * v - back * v).length() < 1e-4,
                        "{expected:?} -> {got:?}"
                    );
                    assert!(approx_eq(got.pitch, expected.pitch, 1e-4));
                }
            }
        }
    }

    #[test]
    fn pitch_is_exactly_half_pi_beyond_poles() {
        let north = Quat::from_rotation_z(PI / 2.0);
        let a = OrientationAngle::from_quat(north);
        assert_eq!(a.pitch, FRAC_PI_2);
        assert_eq!(a.roll, 0.0);

        let south = Quat::from_rotation_z(-PI / 2.0);
        let b = OrientationAngle::from_quat(south);
        assert_eq!(b.pitch, -FRAC_PI_2);
        assert_eq!(b.roll, 0.0);
    }

    #[test]
    fn continuous_across_north_pole_threshold() {
        // Pitch about Z with a small yaw; walk `test` through 0.499.
        let yaw = 0.2_f32;
        let mut prev: Option<OrientationAngle> = None;
        let mut crossed = false;
        let steps = 400;
        for i in 0..=steps {
            let pitch = 1.45 + (FRAC_PI_2 - 1.45) * i as f32 / steps as f32;
            let q = Quat::from_rotation_y(yaw) * Quat::from_rotation_z(pitch);
            let test = q.x * q.y + q.z * q.w;
            let a = OrientationAngle::from_quat(q);
            if let Some(p) = prev {
                assert!(approx_eq(a.pitch, p.pitch, POLE_BAND), "pitch jump at {i}");
                assert!(approx_eq(a.yaw, p.yaw, POLE_BAND), "yaw jump at {i}");
            }
            if test > POLE_THRESHOLD {
                crossed = true;
                assert_eq!(a.pitch, FRAC_PI_2);
            }
            prev = Some(a);
        }
        assert!(crossed);
    }

    #[test]
    fn continuous_across_south_pole_threshold() {
        let yaw = -0.4_f32;
        let mut prev: Option<OrientationAngle> = None;
        let steps = 400;
        for i in 0..=steps {
            let pitch = -1.45 - (FRAC_PI_2 - 1.45) * i as f32 / steps as f32;
            let q = Quat::from_rotation_y(yaw) * Quat::from_rotation_z(pitch);
            let test = q.x * q.y + q.z * q.w;
            let a = OrientationAngle::from_quat(q);
            if let Some(p) = prev {
                assert!(approx_eq(a.pitch, p.pitch, POLE_BAND), "pitch jump at {i}");
                assert!(approx_eq(a.yaw, p.yaw, POLE_BAND), "yaw jump at {i}");
            }
            if test < -POLE_THRESHOLD {
                assert_eq!(a.pitch, -FRAC_PI_2);
            }
            prev = Some(a);
        }
    }
}
