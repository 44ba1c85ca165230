use glam::Vec2;

use crate::{boid::Boid, options::SimulationParams};

// a tracker indexes a snapshot of the flock once per tick and then answers
// neighbourhood queries against that snapshot

/// Neighbour lookup strategy, swappable without touching the update logic.
pub trait Tracker {
    fn new(params: &SimulationParams) -> Self
    where
        Self: Sized;

    /// Re-indexes `entities` from scratch. Must be called before querying.
    fn rebuild(&mut self, entities: &[Boid]);

    /// Pushes every entity of `entities` that passes the toroidal box test
    /// around `position`, except the one at `index`.
    ///
    /// `entities` must be the slice passed to the last [`Tracker::rebuild`].
    fn collect_neighbours<'a>(
        &self,
        entities: &'a [Boid],
        index: usize,
        position: Vec2,
        neighbours: &mut Vec<&'a Boid>,
    );

    /// Human-readable name for display/debugging.
    fn name(&self) -> &'static str;
}
