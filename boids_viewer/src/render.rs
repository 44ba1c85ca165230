use boids_core::{boid::Boid, math_helpers::Saturate, options::Domain};
use nannou::prelude::*;

/// tip distance from the position
pub const BOID_HEIGHT: f32 = 10.;
/// full width of the base
pub const BOID_BASE: f32 = 4.;

/// Maps domain coordinates (origin top-left, y down) onto a nannou window
/// rect (origin centre, y up).
pub struct Surface {
    rect: Rect,
    scale: Vec2,
}

impl Surface {
    pub fn new(rect: Rect, domain: &Domain) -> Self {
        Surface {
            scale: vec2(rect.w() / domain.width, rect.h() / domain.height),
            rect,
        }
    }

    pub fn to_window(&self, p: Vec2) -> Vec2 {
        vec2(
            self.rect.left() + p.x * self.scale.x,
            self.rect.top() - p.y * self.scale.y,
        )
    }
}

/// Tip and the two base corners, in domain coordinates.
pub fn triangle(boid: &Boid) -> [Vec2; 3] {
    let Boid {
        position, velocity, ..
    } = *boid;

    let tip = position + velocity.scale_to(BOID_HEIGHT);
    let normal = vec2(-velocity.y, velocity.x).scale_to(BOID_BASE / 2.);

    [tip, position + normal, position - normal]
}

pub trait Drawable {
    fn draw(&self, draw: &Draw, surface: &Surface);
}

impl Drawable for Boid {
    fn draw(&self, draw: &Draw, surface: &Surface) {
        let vertices = triangle(self).map(|p| surface.to_window(p));

        draw.polygon()
            .no_fill()
            .stroke(GRAY)
            .stroke_weight(1.0)
            .points(vertices);
    }
}

impl Drawable for [Boid] {
    fn draw(&self, draw: &Draw, surface: &Surface) {
        for b in self.iter() {
            b.draw(draw, surface);
        }
    }
}
