use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// 2D vector for arena positions
///
/// x grows rightward from the arena's left edge, y grows upward from ground level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance_to(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }

    /// Linear interpolation; `t` is clamped to [0, 1]
    pub fn lerp(&self, other: Vec2, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        *self + (other - *self) * t
    }

    /// Component-wise clamp into the box spanned by `min` and `max`
    pub fn clamp(&self, min: Vec2, max: Vec2) -> Self {
        Self {
            x: self.x.clamp(min.x, max.x),
            y: self.y.clamp(min.y, max.y),
        }
    }

    /// Check if vector is approximately equal to another
    pub fn approx_eq(&self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_lerp() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 20.0);
        assert!(a.lerp(b, 0.5).approx_eq(Vec2::new(5.0, 10.0), EPSILON));
    }

    #[test]
    fn test_lerp_clamps_progress() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 10.0);
        assert!(a.lerp(b, -1.0).approx_eq(a, EPSILON));
        assert!(a.lerp(b, 2.5).approx_eq(b, EPSILON));
    }

    #[test]
    fn test_clamp() {
        let v = Vec2::new(-5.0, 500.0);
        let clamped = v.clamp(Vec2::ZERO, Vec2::new(740.0, 240.0));
        assert_eq!(clamped, Vec2::new(0.0, 240.0));
    }

    #[test]
    fn test_add_assign() {
        let mut v = Vec2::new(1.0, 2.0);
        v += Vec2::new(3.0, -2.0);
        assert_eq!(v, Vec2::new(4.0, 0.0));
    }
}
