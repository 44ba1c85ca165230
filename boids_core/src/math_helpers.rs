use glam::Vec2;

use crate::options::Domain;

/// Maps any finite value into `[0, range)`, treating the axis as a ring.
///
/// Same mapping as `((value % range) + range) % range`, but values already in
/// range come back bit-identical, and a tiny negative remainder that rounds up
/// to `range` folds onto 0.
#[inline]
pub fn wrap(value: f32, range: f32) -> f32 {
    let rem = value % range;
    if rem >= 0. {
        return rem;
    }
    let wrapped = rem + range;
    if wrapped >= range {
        0.
    } else {
        wrapped
    }
}

/// Wraps both components of a point into the domain.
#[inline]
pub fn wrap_vec(v: Vec2, domain: &Domain) -> Vec2 {
    Vec2::new(wrap(v.x, domain.width), wrap(v.y, domain.height))
}

/// Shortest distance between two coordinates along one wrapped axis.
#[inline]
pub fn tor_axis_distance(a: f32, b: f32, size: f32) -> f32 {
    let d = (a - b).abs();
    d.min(size - d)
}

/// Per-axis toroidal distances between two points, `(dx, dy)`.
#[inline]
pub fn tor_box_distance(p1: Vec2, p2: Vec2, domain: &Domain) -> (f32, f32) {
    (
        tor_axis_distance(p1.x, p2.x, domain.width),
        tor_axis_distance(p1.y, p2.y, domain.height),
    )
}

/// Box test in wrapped space: both axis distances must fit the radius.
///
/// This is a Chebyshev neighbourhood, a square of side `2 * radius` around
/// the point, not a disc.
#[inline]
pub fn within_radius(p1: Vec2, p2: Vec2, radius: f32, domain: &Domain) -> bool {
    let (dx, dy) = tor_box_distance(p1, p2, domain);
    dx <= radius && dy <= radius
}

/// Length operations that glam leaves to the caller.
pub trait Saturate {
    /// Same direction, magnitude `length`. Zero-length input gives the zero vector.
    fn scale_to(self, length: f32) -> Self;

    /// Unchanged if `|v| <= max_length`, otherwise rescaled to exactly `max_length`.
    fn saturate(self, max_length: f32) -> Self;
}

impl Saturate for Vec2 {
    #[inline]
    fn scale_to(self, length: f32) -> Self {
        let current = self.length();
        if current == 0. || !current.is_finite() {
            return Vec2::ZERO;
        }
        self * (length / current)
    }

    #[inline]
    fn saturate(self, max_length: f32) -> Self {
        if self.length() <= max_length {
            self
        } else {
            self.scale_to(max_length)
        }
    }
}
