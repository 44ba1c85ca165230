use std::f32::consts::PI;

use glam::f32::Vec2;
use rand::Rng;

use crate::{
    math_helpers::{wrap_vec, Saturate},
    options::{Domain, SimulationParams},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    // sequential id starting from 0, also the index into the flock
    pub id: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl Boid {
    /// Creates a new [`Boid`] at rest in terms of acceleration.
    pub fn new(id: usize, position: Vec2, velocity: Vec2) -> Self {
        Boid {
            id,
            position,
            velocity,
            acceleration: Vec2::ZERO,
        }
    }

    /// Uniform position over the domain; speed `max_speed / 5 * sqrt(u)`,
    /// which favours slow starters, heading uniform.
    pub fn random<R: Rng + ?Sized>(id: usize, rng: &mut R, params: &SimulationParams) -> Self {
        let x = rng.gen::<f32>() * params.domain.width;
        let y = rng.gen::<f32>() * params.domain.height;

        let speed = params.max_speed / 5. * rng.gen::<f32>().sqrt();
        let angle = 2. * PI * rng.gen::<f32>();

        Boid::new(
            id,
            wrap_vec(Vec2::new(x, y), &params.domain),
            Vec2::new(speed * angle.cos(), speed * angle.sin()),
        )
    }

    /// Step 1: `pos + vel * dt`, wrapped into the domain.
    pub fn integrate_position(&mut self, dt: f32, domain: &Domain) {
        self.position = wrap_vec(self.position + self.velocity * dt, domain);
    }

    /// Step 2: `vel + acc * dt`, saturated to the max speed.
    pub fn integrate_velocity(&mut self, dt: f32, max_speed: f32) {
        self.velocity = (self.velocity + self.acceleration * dt).saturate(max_speed);
    }

    /// Step 3: blends the previous acceleration with the desired one and
    /// saturates. `acc' = decay * acc + (1 - decay) * desired`.
    pub fn apply_desired(&mut self, desired: Vec2, decay: f32, max_acceleration: f32) {
        self.acceleration =
            (self.acceleration * decay + desired * (1. - decay)).saturate(max_acceleration);
    }

    /// Weighted sum of the three rules. No neighbours, no contribution.
    pub fn run_rules(&self, neighbours: &[&Boid], params: &SimulationParams) -> Vec2 {
        if neighbours.is_empty() {
            return Vec2::ZERO;
        }

        let dt = params.dt();
        let weights = &params.weights;

        self.cohesion(neighbours, dt) * weights.cohesion
            + self.alignment(neighbours, dt) * weights.alignment
            + self.separation(neighbours) * weights.separation
    }

    /// Rule 1: `(position - centroid) / dt²`.
    ///
    /// The centroid is the plain mean of the neighbours' coordinates, seams are
    /// not unwrapped.
    pub fn cohesion(&self, others: &[&Boid], dt: f32) -> Vec2 {
        let centroid = mean(others.iter().map(|b| b.position), others.len());
        (self.position - centroid) / dt / dt
    }

    /// Rule 2: `(mean neighbour velocity - velocity) / dt`.
    pub fn alignment(&self, others: &[&Boid], dt: f32) -> Vec2 {
        let avg = mean(others.iter().map(|b| b.velocity), others.len());
        (avg - self.velocity) / dt
    }

    /// Rule 3: `mean neighbour acceleration - acceleration`, no time scaling.
    pub fn separation(&self, others: &[&Boid]) -> Vec2 {
        let avg = mean(others.iter().map(|b| b.acceleration), others.len());
        avg - self.acceleration
    }
}

fn mean(values: impl Iterator<Item = Vec2>, count: usize) -> Vec2 {
    let sum = values.fold(Vec2::ZERO, |acc, v| acc + v);
    sum / count as f32
}
