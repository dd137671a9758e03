//! Planar vector math for the arena floor.
//!
//! The arena is simulated on the ground plane. [`Vec2::x`] runs east and
//! [`Vec2::y`] runs north; the terrain height field supplies the third axis
//! where it matters (slope-dependent movement).

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f64 = 1e-9;

/// A 2D vector on the arena floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// East-west component.
    pub x: f64,
    /// North-south component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Squared length.
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > EPSILON {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Unit vector in the same direction, or zero.
    pub fn normalize_or_zero(self) -> Self {
        self.normalized().unwrap_or(Self::ZERO)
    }

    /// Scale the vector down so its length is at most `max`.
    pub fn clamp_length(self, max: f64) -> Self {
        let len = self.length();
        if len > max && len > EPSILON {
            self * (max / len)
        } else {
            self
        }
    }

    /// Whether both components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Replace non-finite components with zero.
    pub const fn finite_or_zero(self) -> Self {
        Self {
            x: if self.x.is_finite() { self.x } else { 0.0 },
            y: if self.y.is_finite() { self.y } else { 0.0 },
        }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangular bounds of the arena floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner (inclusive).
    pub min: Vec2,
    /// Maximum corner (inclusive).
    pub max: Vec2,
}

impl Bounds {
    /// Square bounds centred on the origin with the given half-extent.
    pub const fn square(half_extent: f64) -> Self {
        Self {
            min: Vec2::new(-half_extent, -half_extent),
            max: Vec2::new(half_extent, half_extent),
        }
    }

    /// Whether `p` lies inside the bounds (edges included).
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clamp `p` into the bounds shrunk by `margin` on every side.
    pub fn clamp(&self, p: Vec2, margin: f64) -> Vec2 {
        Vec2::new(
            clamp_axis(p.x, self.min.x + margin, self.max.x - margin),
            clamp_axis(p.y, self.min.y + margin, self.max.y - margin),
        )
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Clamp without panicking when `lo > hi` (degenerate margin): the midpoint wins.
fn clamp_axis(v: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        (lo + hi) * 0.5
    } else {
        v.max(lo).min(hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalized_zero_is_none() {
        assert!(Vec2::ZERO.normalized().is_none());
        assert!(Vec2::new(f64::NAN, 1.0).normalized().is_none());
    }

    #[test]
    fn clamp_length_caps_magnitude() {
        let v = Vec2::new(3.0, 4.0).clamp_length(1.0);
        assert!(close(v.length(), 1.0));
        let short = Vec2::new(0.3, 0.0).clamp_length(1.0);
        assert!(close(short.x, 0.3));
    }

    #[test]
    fn bounds_clamp_respects_margin() {
        let b = Bounds::square(10.0);
        let p = b.clamp(Vec2::new(50.0, -50.0), 1.0);
        assert!(close(p.x, 9.0));
        assert!(close(p.y, -9.0));
    }

    #[test]
    fn finite_or_zero_scrubs_nan() {
        let v = Vec2::new(f64::INFINITY, 2.0).finite_or_zero();
        assert!(close(v.x, 0.0));
        assert!(close(v.y, 2.0));
    }
}
