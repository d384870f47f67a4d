use derive_more::{Add, AddAssign, Mul, Neg, Sub};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A 2D offset or force. Carries no origin of its own; callers document
/// whether it is anchor-relative or viewport-absolute.
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Add, AddAssign, Sub, Mul, Neg, Serialize, Deserialize,
)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

/// Absolute position in viewport space.
pub type Point = Vector;

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `radius` along `angle` (radians, 0 = +x, y grows downward).
    pub fn from_polar(angle: f64, radius: f64) -> Self {
        Self::new(radius * angle.cos(), radius * angle.sin())
    }

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Angle in `(-PI, PI]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 { self * (1.0 / mag) } else { Self::ZERO }
    }

    /// Clamps the length to `max` without changing direction.
    pub fn limit_magnitude(self, max: f64) -> Self {
        let mag = self.magnitude();
        if mag > max && mag > 0.0 {
            self * (max.max(0.0) / mag)
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vector,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Vector, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn overlaps(&self, other: &Circle) -> bool {
        self.center.distance(other.center) < self.radius + other.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether `circle` (absolute frame) lies within the rectangle shrunk by `padding`.
    pub fn contains(&self, circle: &Circle, padding: f64) -> bool {
        let Circle { center, radius } = *circle;
        center.x - radius >= padding
            && center.x + radius <= self.width - padding
            && center.y - radius >= padding
            && center.y + radius <= self.height - padding
    }
}

/// Push that separates `a` from `b`, applied to `a`.
///
/// Zero unless the circles overlap. The magnitude is half the penetration
/// depth so that two mutually repelling circles each cover half the gap.
/// Coincident centers fall back to a unit `+x` nudge; see
/// [`repulsion_force_with_nudge`] to pick the direction.
pub fn repulsion_force(a: &Circle, b: &Circle) -> Vector {
    repulsion_force_with_nudge(a, b, Vector::new(1.0, 0.0))
}

/// Like [`repulsion_force`], but coincident centers push along `nudge`.
pub fn repulsion_force_with_nudge(a: &Circle, b: &Circle, nudge: Vector) -> Vector {
    let delta = a.center - b.center;
    let distance = delta.magnitude();
    let min_distance = a.radius + b.radius;

    if distance >= min_distance {
        return Vector::ZERO;
    }

    let depth = min_distance - distance;
    let direction = if distance > 0.0 {
        delta * (1.0 / distance)
    } else {
        nudge.normalize()
    };
    direction * (depth / 2.0)
}

/// Restoring force for a circle at absolute `point` that crosses any of the
/// four padded viewport edges. Each axis sums the crossing depth on both
/// sides, so an oversized circle in a tiny viewport gets balanced pushes.
pub fn edge_force(point: Point, radius: f64, padding: f64, viewport: &Viewport) -> Vector {
    let mut force = Vector::ZERO;

    let left = padding - (point.x - radius);
    if left > 0.0 {
        force.x += left;
    }
    let right = (point.x + radius) - (viewport.width - padding);
    if right > 0.0 {
        force.x -= right;
    }
    let top = padding - (point.y - radius);
    if top > 0.0 {
        force.y += top;
    }
    let bottom = (point.y + radius) - (viewport.height - padding);
    if bottom > 0.0 {
        force.y -= bottom;
    }

    force
}

/// Linear spring toward `target`; not normalized.
pub fn attraction_force(current: Vector, target: Vector, strength: f64) -> Vector {
    (target - current) * strength
}

/// Normalizes an angle into `[0, 2PI)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vector::ZERO.normalize(), Vector::ZERO);
        let n = Vector::new(3.0, 4.0).normalize();
        assert!((n.magnitude() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_limit_magnitude_keeps_direction() {
        let v = Vector::new(30.0, 40.0).limit_magnitude(5.0);
        assert!((v.x - 3.0).abs() < EPS);
        assert!((v.y - 4.0).abs() < EPS);

        let short = Vector::new(1.0, 1.0);
        assert_eq!(short.limit_magnitude(5.0), short);
    }

    #[test]
    fn test_repulsion_zero_without_overlap() {
        let a = Circle::new(Vector::new(0.0, 0.0), 10.0);
        let b = Circle::new(Vector::new(20.0, 0.0), 10.0);
        assert_eq!(repulsion_force(&a, &b), Vector::ZERO);
    }

    #[test]
    fn test_repulsion_half_penetration() {
        let a = Circle::new(Vector::new(0.0, 0.0), 10.0);
        let b = Circle::new(Vector::new(16.0, 0.0), 10.0);
        let f = repulsion_force(&a, &b);
        // depth 4, pushed away from b
        assert!((f.x + 2.0).abs() < EPS);
        assert!(f.y.abs() < EPS);
        assert_eq!(repulsion_force(&b, &a), -f);
    }

    #[test]
    fn test_repulsion_coincident_uses_nudge() {
        let a = Circle::new(Vector::new(5.0, 5.0), 10.0);
        let b = Circle::new(Vector::new(5.0, 5.0), 6.0);
        let f = repulsion_force_with_nudge(&a, &b, Vector::new(0.0, -3.0));
        assert!(f.x.abs() < EPS);
        assert!((f.y + 8.0).abs() < EPS);
    }

    #[test]
    fn test_edge_force_per_side() {
        let vp = Viewport::new(100.0, 100.0);
        assert_eq!(edge_force(Vector::new(50.0, 50.0), 10.0, 5.0, &vp), Vector::ZERO);

        let f = edge_force(Vector::new(12.0, 90.0), 10.0, 5.0, &vp);
        assert!((f.x - 3.0).abs() < EPS);
        assert!((f.y + 5.0).abs() < EPS);
    }

    #[test]
    fn test_attraction_is_linear() {
        let f = attraction_force(Vector::new(0.0, 0.0), Vector::new(10.0, -20.0), 0.5);
        assert_eq!(f, Vector::new(5.0, -10.0));
    }

    #[test]
    fn test_viewport_contains() {
        let vp = Viewport::new(200.0, 100.0);
        assert!(vp.contains(&Circle::new(Vector::new(100.0, 50.0), 20.0), 10.0));
        assert!(!vp.contains(&Circle::new(Vector::new(25.0, 50.0), 20.0), 10.0));
    }

    #[test]
    fn test_normalize_angle() {
        let quarter = normalize_angle(-std::f64::consts::FRAC_PI_2);
        assert!((quarter - 1.5 * std::f64::consts::PI).abs() < EPS);
        assert_eq!(normalize_angle(TAU), 0.0);
    }
}
