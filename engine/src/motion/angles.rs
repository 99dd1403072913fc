//! Angle Helpers
//!
//! Degree-based angle arithmetic shared by the springs and the view controller.
//!
//! # Conventions
//!
//! - Angles are stored in degrees
//! - Canonical range is (-180, 180]
//! - Euler triples are `(pitch, yaw, roll)` and compose as yaw (Y), then pitch (X), then roll (Z)
//! - Positive pitch looks up, positive yaw turns left (right-handed, +Y up, -Z forward)

use glam::{EulerRot, Quat, Vec3};

/// Wrap an angle in degrees into the half-open range (-180, 180].
///
/// Non-finite input returns 0 so a bad sample can never poison an accumulator.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Wrap every component of an Euler triple into (-180, 180].
#[inline]
pub fn wrap_euler(euler: Vec3) -> Vec3 {
    Vec3::new(wrap_angle(euler.x), wrap_angle(euler.y), wrap_angle(euler.z))
}

/// Shortest signed difference `to - from` in degrees, in (-180, 180].
#[inline]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Clamp an angle to `[min, max]` after wrapping it into the canonical range.
///
/// The limits are expected within [-180, 180] and `min <= max`.
#[inline]
pub fn clamp_angle(angle: f32, min: f32, max: f32) -> f32 {
    wrap_angle(angle).clamp(min, max)
}

/// Interpolate between two angles along the shortest arc.
#[inline]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + delta_angle(from, to) * t.clamp(0.0, 1.0))
}

/// Linear interpolation between two values (unclamped).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Build a rotation from a `(pitch, yaw, roll)` Euler triple in degrees.
#[inline]
pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// Decompose a rotation into a `(pitch, yaw, roll)` Euler triple in degrees.
#[inline]
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_wrap_angle_range() {
        assert!(approx_eq(wrap_angle(190.0), -170.0));
        assert!(approx_eq(wrap_angle(-190.0), 170.0));
        assert!(approx_eq(wrap_angle(720.0), 0.0));
        assert!(approx_eq(wrap_angle(45.0), 45.0));
    }

    #[test]
    fn test_wrap_angle_boundaries() {
        // 180 stays, -180 maps to 180
        assert!(approx_eq(wrap_angle(180.0), 180.0));
        assert!(approx_eq(wrap_angle(-180.0), 180.0));
        assert!(approx_eq(wrap_angle(540.0), 180.0));
    }

    #[test]
    fn test_wrap_angle_non_finite() {
        assert_eq!(wrap_angle(f32::NAN), 0.0);
        assert_eq!(wrap_angle(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_delta_angle_shortest_arc() {
        assert!(approx_eq(delta_angle(170.0, -170.0), 20.0));
        assert!(approx_eq(delta_angle(-170.0, 170.0), -20.0));
        assert!(approx_eq(delta_angle(10.0, 30.0), 20.0));
    }

    #[test]
    fn test_clamp_angle() {
        assert!(approx_eq(clamp_angle(100.0, -80.0, 80.0), 80.0));
        assert!(approx_eq(clamp_angle(-100.0, -80.0, 80.0), -80.0));
        assert!(approx_eq(clamp_angle(370.0, -80.0, 80.0), 10.0));
    }

    #[test]
    fn test_lerp_angle_crosses_seam() {
        let mid = lerp_angle(170.0, -170.0, 0.5);
        assert!(approx_eq(mid.abs(), 180.0));
    }

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(20.0, -35.0, 5.0);
        let back = quat_to_euler(euler_to_quat(euler));
        assert!(approx_eq(back.x, euler.x));
        assert!(approx_eq(back.y, euler.y));
        assert!(approx_eq(back.z, euler.z));
    }

    #[test]
    fn test_positive_pitch_looks_up() {
        let forward = euler_to_quat(Vec3::new(30.0, 0.0, 0.0)) * Vec3::NEG_Z;
        assert!(forward.y > 0.0);
    }
}
