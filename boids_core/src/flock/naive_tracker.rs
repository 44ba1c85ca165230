use glam::Vec2;

use crate::{
    boid::Boid,
    math_helpers::within_radius,
    options::{Domain, SimulationParams},
};

use super::tracker::Tracker;

/// A naive implementation of boids tracking, which uses an O(N^2) algorithm for
/// finding boid's neighbours. Kept as the reference the grid is checked against.
pub struct NaiveTracker {
    radius: f32,
    domain: Domain,
}

impl Tracker for NaiveTracker {
    fn new(params: &SimulationParams) -> Self {
        NaiveTracker {
            radius: params.neighbourhood_radius,
            domain: params.domain,
        }
    }

    fn rebuild(&mut self, _: &[Boid]) {
        // noop, every query scans the whole snapshot
    }

    fn collect_neighbours<'a>(
        &self,
        entities: &'a [Boid],
        index: usize,
        position: Vec2,
        neighbours: &mut Vec<&'a Boid>,
    ) {
        for (i_other, b_other) in entities.iter().enumerate() {
            if i_other == index {
                continue;
            }

            if within_radius(position, b_other.position, self.radius, &self.domain) {
                neighbours.push(b_other);
            }
        }
    }

    fn name(&self) -> &'static str {
        "Naive"
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::NaiveTracker;
    use crate::{
        boid::Boid,
        flock::tracker::Tracker,
        options::{Domain, SimulationParams},
    };

    #[test]
    fn finds_everyone_in_the_box_but_itself() {
        let params = SimulationParams {
            domain: Domain::new(100., 100.),
            neighbourhood_radius: 10.,
            ..Default::default()
        };
        let boids: Vec<Boid> = [(50., 50.), (59., 41.), (61., 50.), (95., 50.), (50., 50.)]
            .iter()
            .enumerate()
            .map(|(id, (x, y))| Boid::new(id, Vec2::new(*x, *y), Vec2::ZERO))
            .collect();

        let tracker = NaiveTracker::new(&params);
        let mut neighbours = Vec::new();
        tracker.collect_neighbours(&boids, 0, boids[0].position, &mut neighbours);

        let ids: Vec<usize> = neighbours.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(tracker.name(), "Naive");
    }

    #[test]
    fn wraps_around_the_seam() {
        let params = SimulationParams {
            domain: Domain::new(100., 100.),
            neighbourhood_radius: 10.,
            ..Default::default()
        };
        let boids = vec![
            Boid::new(0, Vec2::new(2., 2.), Vec2::ZERO),
            Boid::new(1, Vec2::new(97., 98.), Vec2::ZERO),
        ];

        let tracker = NaiveTracker::new(&params);
        let mut neighbours = Vec::new();
        tracker.collect_neighbours(&boids, 0, boids[0].position, &mut neighbours);

        assert_eq!(neighbours.len(), 1);
        assert_eq!(neighbours[0].id, 1);
    }
}
