//! Strike geometry for melee and special attacks.
//!
//! A strike lands when the target is within range (centre to centre) and
//! the attacker is facing it: the dot product of the attacker's facing and
//! the unit vector toward the target must reach the facing threshold. A
//! target standing exactly on the attacker counts as in front.

use skirmish_types::Vec2;

/// Whether a strike from `from` facing `facing` reaches `target`.
pub fn strike_lands(from: Vec2, facing: Vec2, target: Vec2, range: f64, facing_threshold: f64) -> bool {
    let offset = target - from;
    if offset.length() > range {
        return false;
    }
    match (offset.normalized(), facing.normalized()) {
        (None, _) => true,
        (Some(toward), Some(facing)) => facing.dot(toward) >= facing_threshold,
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EAST: Vec2 = Vec2::new(1.0, 0.0);

    #[test]
    fn in_range_and_facing_lands() {
        assert!(strike_lands(Vec2::ZERO, EAST, Vec2::new(2.0, 0.0), 2.2, 0.5));
    }

    #[test]
    fn out_of_range_misses() {
        assert!(!strike_lands(Vec2::ZERO, EAST, Vec2::new(2.3, 0.0), 2.2, 0.5));
    }

    #[test]
    fn behind_misses() {
        assert!(!strike_lands(Vec2::ZERO, EAST, Vec2::new(-1.0, 0.0), 2.2, 0.5));
    }

    #[test]
    fn wide_angle_misses() {
        // 70 degrees off the facing axis: cos(70) < 0.5.
        let t = Vec2::new(70f64.to_radians().cos(), 70f64.to_radians().sin());
        assert!(!strike_lands(Vec2::ZERO, EAST, t, 2.2, 0.5));
    }
}
