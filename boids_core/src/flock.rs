use rand::Rng;
use tracing::trace;

use crate::{boid::Boid, options::SimulationParams};

use self::{spathash_tracker::SpatialGrid, tracker::Tracker};

pub mod naive_tracker;
pub mod spathash_tracker;
pub mod tracker;

/// A population of boids together with the neighbour index it is stepped with.
///
/// Each tick reads neighbours from a snapshot of the previous state, so the
/// order the boids are visited in does not change the outcome.
pub struct Flock<T: Tracker = SpatialGrid> {
    boids: Vec<Boid>,
    /// pre-tick copy the tracker indexes
    previous: Vec<Boid>,
    tracker: T,
    params: SimulationParams,
}

impl<T: Tracker> Flock<T> {
    /// Fresh random population sized by `params.population`.
    pub fn new<R: Rng + ?Sized>(params: &SimulationParams, rng: &mut R) -> Self {
        let boids = (0..params.population)
            .map(|id| Boid::random(id, rng, params))
            .collect();

        Self::from_boids(boids, params)
    }

    /// Takes over an existing population; ids are reassigned to match indices.
    pub fn from_boids(mut boids: Vec<Boid>, params: &SimulationParams) -> Self {
        boids.iter_mut().enumerate().for_each(|(id, b)| b.id = id);

        Flock {
            previous: Vec::with_capacity(boids.len()),
            boids,
            tracker: T::new(params),
            params: params.clone(),
        }
    }

    /// Advances every boid by one fixed step.
    pub fn update(&mut self) {
        let dt = self.params.dt();
        let params = &self.params;

        self.previous.clone_from(&self.boids);
        self.tracker.rebuild(&self.previous);

        let mut neighbours: Vec<&Boid> = Vec::with_capacity(32);
        let mut interactions: usize = 0;

        for (index, boid) in self.boids.iter_mut().enumerate() {
            boid.integrate_position(dt, &params.domain);
            boid.integrate_velocity(dt, params.max_speed);

            neighbours.clear();
            self.tracker
                .collect_neighbours(&self.previous, index, boid.position, &mut neighbours);
            interactions += neighbours.len();

            let desired = boid.run_rules(&neighbours, params);
            boid.apply_desired(desired, params.acceleration_decay, params.max_acceleration);
        }

        trace!(
            tracker = self.tracker.name(),
            boids = self.boids.len(),
            interactions,
            "flock updated"
        );
    }

    /// Read-only view of the current population, in id order.
    pub fn view(&self) -> &[Boid] {
        &self.boids
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Swaps in parameters that do not touch the population or the grid.
    ///
    /// Callers are expected to have classified the change as live.
    pub fn set_live_params(&mut self, params: &SimulationParams) {
        debug_assert!(
            self.params.population == params.population
                && self.params.neighbourhood_radius == params.neighbourhood_radius
                && self.params.domain == params.domain,
            "structural change applied as live"
        );
        self.params.clone_from(params);
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}
