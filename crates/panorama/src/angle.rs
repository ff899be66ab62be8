/// Degrees in a full turn.
pub const FULL_TURN: f64 = 360.0;

/// Largest pitch magnitude; looking straight up or down.
pub const MAX_PITCH: f64 = 90.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum AngleError {
    #[error("angle is not a finite number")]
    NotFinite,
    #[error("field of view must be positive, got {0}")]
    NonPositiveFov(f64),
}

/// Wrap an angle into `[0, 360)`.
///
/// Computed as `((a mod 360) + 360) mod 360`; the second remainder
/// absorbs the rounding that can push `a mod 360 + 360` up to exactly
/// 360. Non-finite input maps to 0.
pub fn wrap_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    ((angle % FULL_TURN) + FULL_TURN) % FULL_TURN
}

/// Wrap an angle into `(-180, 180]`.
pub fn signed_degrees(angle: f64) -> f64 {
    let wrapped = wrap_degrees(angle);
    if wrapped > FULL_TURN / 2.0 {
        wrapped - FULL_TURN
    } else {
        wrapped
    }
}

/// Clamp a pitch into `[-90, 90]`.
pub fn clamp_pitch(pitch: f64) -> f64 {
    pitch.clamp(-MAX_PITCH, MAX_PITCH)
}

/// Checked variant of [`wrap_degrees`] that rejects non-finite input
/// instead of silently mapping it to 0.
pub fn checked_wrap(angle: f64) -> Result<f64, AngleError> {
    if angle.is_finite() {
        Ok(wrap_degrees(angle))
    } else {
        Err(AngleError::NotFinite)
    }
}

pub fn checked_pitch(pitch: f64) -> Result<f64, AngleError> {
    if pitch.is_finite() {
        Ok(clamp_pitch(pitch))
    } else {
        Err(AngleError::NotFinite)
    }
}

pub fn checked_fov(fov: f64) -> Result<f64, AngleError> {
    if !fov.is_finite() {
        Err(AngleError::NotFinite)
    } else if fov <= 0.0 {
        Err(AngleError::NonPositiveFov(fov))
    } else {
        Ok(fov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap_degrees_known_values() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
        assert_eq!(wrap_degrees(-0.0), 0.0);
        assert_eq!(wrap_degrees(f64::NAN), 0.0);
    }

    #[test]
    fn test_wrap_degrees_tiny_negative_stays_below_full_turn() {
        let wrapped = wrap_degrees(-1e-14);
        assert!((0.0..FULL_TURN).contains(&wrapped), "got {}", wrapped);
    }

    #[test]
    fn test_signed_degrees_half_open_range() {
        assert_eq!(signed_degrees(-180.0), 180.0);
        assert_eq!(signed_degrees(180.0), 180.0);
        assert_eq!(signed_degrees(270.0), -90.0);
        assert_eq!(signed_degrees(-45.0), -45.0);
    }

    #[test]
    fn test_checked_helpers_reject_bad_input() {
        assert_eq!(checked_wrap(f64::INFINITY), Err(AngleError::NotFinite));
        assert_eq!(checked_pitch(120.0), Ok(90.0));
        assert_eq!(checked_pitch(-120.0), Ok(-90.0));
        assert_eq!(checked_fov(0.0), Err(AngleError::NonPositiveFov(0.0)));
        assert_eq!(checked_fov(75.0), Ok(75.0));
    }

    proptest! {
        #[test]
        fn prop_wrap_degrees_in_range(angle in -1.0e12f64..1.0e12) {
            let wrapped = wrap_degrees(angle);
            prop_assert!((0.0..FULL_TURN).contains(&wrapped));
        }

        #[test]
        fn prop_signed_degrees_in_range(angle in -1.0e12f64..1.0e12) {
            let signed = signed_degrees(angle);
            prop_assert!(signed > -180.0 && signed <= 180.0);
        }
    }
}
