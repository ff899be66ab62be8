use crate::angle::signed_degrees;
use crate::vector::Vec3;

/// Spherical direction and range from one viewpoint to another.
///
/// `yaw` is measured in the floor plane from the +x axis towards +y, in
/// `(-180, 180]`. `pitch` follows the viewer convention where a target
/// above the viewpoint (positive dz) has a *negative* pitch, so straight
/// up is -90 and straight down is +90.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bearing {
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
}

/// Bearing from `from` to `to`.
///
/// Returns `None` when the two points coincide (no direction can be
/// derived) or when the offset is not finite.
pub fn bearing_between(from: Vec3, to: Vec3) -> Option<Bearing> {
    let delta = to - from;
    let distance = delta.norm();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }

    let yaw = signed_degrees(delta.y.atan2(delta.x).to_degrees());
    // dz can overshoot distance by an ulp; asin is undefined past 1
    let sine = (delta.z / distance).clamp(-1.0, 1.0);
    let pitch = -sine.asin().to_degrees();

    Some(Bearing {
        yaw,
        pitch,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_bearing_along_x_axis() {
        let b = bearing_between(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0))
            .expect("distinct points have a bearing");

        assert!(b.yaw.abs() < EPS, "yaw was {}", b.yaw);
        assert!(b.pitch.abs() < EPS, "pitch was {}", b.pitch);
        assert!((b.distance - 1.0).abs() < EPS);
    }

    #[test]
    fn test_bearing_straight_up_is_negative_ninety() {
        let b = bearing_between(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0))
            .expect("distinct points have a bearing");

        assert!((b.pitch + 90.0).abs() < EPS, "pitch was {}", b.pitch);
        assert!((b.distance - 1.0).abs() < EPS);
    }

    #[test]
    fn test_bearing_straight_down_is_positive_ninety() {
        let b = bearing_between(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
            .expect("distinct points have a bearing");

        assert!((b.pitch - 90.0).abs() < EPS, "pitch was {}", b.pitch);
    }

    #[test]
    fn test_bearing_quadrants() {
        let north = bearing_between(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0))
            .expect("bearing");
        let west = bearing_between(Vec3::ZERO, Vec3::new(-3.0, 0.0, 0.0))
            .expect("bearing");
        let south = bearing_between(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0))
            .expect("bearing");

        assert!((north.yaw - 90.0).abs() < EPS);
        assert!((west.yaw - 180.0).abs() < EPS);
        assert!((south.yaw + 90.0).abs() < EPS);
    }

    #[test]
    fn test_bearing_west_with_negative_zero_dy_is_positive_180() {
        let b = bearing_between(Vec3::ZERO, Vec3::new(-1.0, -0.0, 0.0))
            .expect("bearing");
        assert!((b.yaw - 180.0).abs() < EPS, "yaw was {}", b.yaw);
    }

    #[test]
    fn test_coincident_points_have_no_bearing() {
        let p = Vec3::new(4.0, -1.0, 2.5);
        assert_eq!(bearing_between(p, p), None);
    }

    #[test]
    fn test_bearing_with_rise_over_run() {
        // 45 degrees above the horizon, along +x
        let b = bearing_between(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0))
            .expect("bearing");

        assert!(b.yaw.abs() < EPS);
        assert!((b.pitch + 45.0).abs() < 1e-9);
        assert!((b.distance - 2.0f64.sqrt()).abs() < EPS);
    }
}
