use glam::Vec2;
use itertools::iproduct;

use crate::{
    boid::Boid,
    math_helpers::within_radius,
    options::{Domain, SimulationParams},
};

use super::tracker::Tracker;

/// Dimensions of the bucket grid laid over the toroidal domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// grid x range, `ceil(width / cell_size)`
    pub cols: usize,
    /// grid y range, `ceil(height / cell_size)`
    pub rows: usize,
    /// n cells of grid
    pub cell_count: usize,
    /// side of one square cell, equal to the neighbourhood radius
    pub cell_size: f32,
    pub radius: f32,
    pub domain: Domain,
}

impl GridSettings {
    pub fn from_params(params: &SimulationParams) -> Self {
        let (cols, rows) = params.grid_dimensions();

        GridSettings {
            cols,
            rows,
            cell_count: cols * rows,
            cell_size: params.neighbourhood_radius,
            radius: params.neighbourhood_radius,
            domain: params.domain,
        }
    }
}

/// Per-cell range into the flat `table`.
#[derive(Clone, Copy, Debug, Default)]
struct Pivot {
    /// number of entities in the cell
    usg: usize,
    /// first slot of the cell in `table`
    init: usize,
}

/// Uniform bucket grid over a wrap-around domain.
///
/// Buckets are not separate vectors: entity indices live in one flat `table`,
/// grouped by cell with a counting sort, and each cell owns the range
/// `init..init + usg` of it. Inside a cell entities keep flock order. After the
/// first rebuild for a given flock size no allocation happens.
pub struct SpatialGrid {
    pub(crate) settings: GridSettings,
    pivots: Vec<Pivot>,
    /// entity indices grouped by cell
    table: Vec<usize>,
    /// for each entity, the cell it was put in
    index: Vec<usize>,
    /// scratch write heads for the scatter pass
    cursor: Vec<usize>,
}

impl SpatialGrid {
    pub fn with_settings(settings: GridSettings) -> Self {
        SpatialGrid {
            pivots: vec![Default::default(); settings.cell_count],
            table: Vec::new(),
            index: Vec::new(),
            cursor: vec![0; settings.cell_count],
            settings,
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// `(row, col)` of the cell containing `position`, wrapped into the grid.
    #[inline]
    pub fn cell_of(&self, position: Vec2) -> (usize, usize) {
        let row = (position.y / self.settings.cell_size).floor() as i64;
        let col = (position.x / self.settings.cell_size).floor() as i64;

        (
            row.rem_euclid(self.settings.rows as i64) as usize,
            col.rem_euclid(self.settings.cols as i64) as usize,
        )
    }

    #[inline]
    fn flat(&self, row: usize, col: usize) -> usize {
        row * self.settings.cols + col
    }

    /// Entity indices stored in bucket `(row, col)`.
    pub fn bucket(&self, row: usize, col: usize) -> &[usize] {
        self.cell(self.flat(row, col))
    }

    fn cell(&self, cell: usize) -> &[usize] {
        let pivot = self.pivots[cell];
        &self.table[pivot.init..pivot.init + pivot.usg]
    }

    /// Cell the entity at `entity` was placed in by the last rebuild.
    pub fn cell_index_of(&self, entity: usize) -> Option<usize> {
        self.index.get(entity).copied()
    }

    /// The 3x3 block of cells centred on `(row, col)`, wrapped around the
    /// edges. Row-major, top-left first.
    ///
    /// On grids narrower than 3 cells the same cell shows up under several
    /// offsets and is listed once per offset, so its entities are counted
    /// that many times.
    pub fn block_around(&self, row: usize, col: usize) -> [usize; 9] {
        let rows = self.settings.rows as i64;
        let cols = self.settings.cols as i64;
        let mut block = [0; 9];

        for (slot, (dr, dc)) in block.iter_mut().zip(iproduct!(-1_i64..=1, -1_i64..=1)) {
            let r = (row as i64 + dr).rem_euclid(rows) as usize;
            let c = (col as i64 + dc).rem_euclid(cols) as usize;
            *slot = self.flat(r, c);
        }

        block
    }

    /// Lazily yields the neighbours of the entity at `index`, standing at
    /// `position`, out of the snapshot the grid was built from.
    pub fn neighbours_of<'s, 'a: 's>(
        &'s self,
        entities: &'a [Boid],
        index: usize,
        position: Vec2,
    ) -> impl Iterator<Item = &'a Boid> + 's {
        let (row, col) = self.cell_of(position);
        let radius = self.settings.radius;
        let domain = self.settings.domain;

        self.block_around(row, col)
            .into_iter()
            .flat_map(move |cell| self.cell(cell).iter().copied())
            .filter(move |&other| other != index)
            .map(move |other| &entities[other])
            .filter(move |other| within_radius(position, other.position, radius, &domain))
    }
}

impl Tracker for SpatialGrid {
    fn new(params: &SimulationParams) -> Self {
        SpatialGrid::with_settings(GridSettings::from_params(params))
    }

    fn rebuild(&mut self, entities: &[Boid]) {
        // reset pivot metadata, nothing may linger from the previous tick
        self.pivots.iter_mut().for_each(|pivot| *pivot = Default::default());

        self.index.resize(entities.len(), 0);
        self.table.resize(entities.len(), 0);

        for (e, entity) in entities.iter().enumerate() {
            let (row, col) = self.cell_of(entity.position);
            let cell = self.flat(row, col);

            self.index[e] = cell;
            self.pivots[cell].usg += 1;
        }

        let mut accum: usize = 0;
        for (pivot, cursor) in self.pivots.iter_mut().zip(self.cursor.iter_mut()) {
            pivot.init = accum;
            *cursor = accum;
            accum += pivot.usg;
        }

        // scatter in flock order so buckets stay stable
        for (e, &cell) in self.index.iter().enumerate() {
            self.table[self.cursor[cell]] = e;
            self.cursor[cell] += 1;
        }
    }

    fn collect_neighbours<'a>(
        &self,
        entities: &'a [Boid],
        index: usize,
        position: Vec2,
        neighbours: &mut Vec<&'a Boid>,
    ) {
        neighbours.extend(self.neighbours_of(entities, index, position));
    }

    fn name(&self) -> &'static str {
        "SpatialGrid"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_relative_eq;
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;
    use rstest::rstest;

    use super::{GridSettings, SpatialGrid};
    use crate::{
        boid::Boid,
        flock::{naive_tracker::NaiveTracker, tracker::Tracker},
        math_helpers::within_radius,
        options::{Domain, SimulationParams},
    };

    fn params(width: f32, height: f32, radius: f32) -> SimulationParams {
        SimulationParams {
            domain: Domain::new(width, height),
            neighbourhood_radius: radius,
            ..Default::default()
        }
    }

    fn at(points: &[(f32, f32)]) -> Vec<Boid> {
        points
            .iter()
            .enumerate()
            .map(|(id, (x, y))| Boid::new(id, Vec2::new(*x, *y), Vec2::ZERO))
            .collect()
    }

    fn random_flock(n: usize, params: &SimulationParams, seed: u64) -> Vec<Boid> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        (0..n).map(|id| Boid::random(id, &mut rng, params)).collect()
    }

    fn neighbour_ids(grid: &SpatialGrid, boids: &[Boid], index: usize) -> Vec<usize> {
        grid.neighbours_of(boids, index, boids[index].position)
            .map(|b| b.id)
            .collect()
    }

    #[test]
    fn settings_follow_radius() {
        let settings = GridSettings::from_params(&params(600., 600., 50.));
        assert_eq!(settings.cols, 12);
        assert_eq!(settings.rows, 12);
        assert_eq!(settings.cell_count, 144);
    }

    #[test]
    fn every_entity_lands_in_exactly_one_bucket() {
        let p = params(600., 400., 50.);
        let boids = random_flock(2000, &p, 11);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        let mut seen = vec![0usize; boids.len()];
        for row in 0..grid.settings().rows {
            for col in 0..grid.settings().cols {
                for &e in grid.bucket(row, col) {
                    seen[e] += 1;

                    let b = &boids[e];
                    assert_eq!(row, (b.position.y / 50.).floor() as usize % grid.settings().rows);
                    assert_eq!(col, (b.position.x / 50.).floor() as usize % grid.settings().cols);
                }
            }
        }

        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn buckets_keep_flock_order() {
        let p = params(100., 100., 50.);
        let boids = at(&[(10., 10.), (60., 60.), (20., 20.), (30., 5.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(grid.bucket(0, 0), &[0, 2, 3]);
        assert_eq!(grid.bucket(1, 1), &[1]);
        assert!(grid.bucket(0, 1).is_empty());
        assert_eq!(grid.cell_index_of(1), Some(3));
    }

    #[test]
    fn rebuild_clears_previous_tick() {
        let p = params(100., 100., 50.);
        let mut grid = SpatialGrid::new(&p);

        grid.rebuild(&at(&[(10., 10.), (20., 20.)]));
        grid.rebuild(&at(&[(80., 80.), (90., 90.)]));

        assert!(grid.bucket(0, 0).is_empty());
        assert_eq!(grid.bucket(1, 1), &[0, 1]);
    }

    #[test]
    fn close_pair_see_each_other() {
        let p = params(100., 100., 50.);
        let boids = at(&[(0., 0.), (5., 5.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(neighbour_ids(&grid, &boids, 0), vec![1]);
        assert_eq!(neighbour_ids(&grid, &boids, 1), vec![0]);
    }

    #[test]
    fn never_includes_itself() {
        let p = params(100., 100., 10.);
        let boids = at(&[(50., 50.), (50., 50.), (52., 48.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        for index in 0..boids.len() {
            let ids = neighbour_ids(&grid, &boids, index);
            assert!(!ids.contains(&index));
            assert_eq!(ids.len(), 2);
        }
    }

    #[rstest]
    #[case::left_right((1., 50.), (99., 50.))]
    #[case::top_bottom((50., 1.), (50., 99.))]
    #[case::corners((1., 1.), (99., 99.))]
    fn sees_across_the_seam(#[case] a: (f32, f32), #[case] b: (f32, f32)) {
        let p = params(100., 100., 10.);
        let boids = at(&[a, b]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(neighbour_ids(&grid, &boids, 0), vec![1]);
        assert_eq!(neighbour_ids(&grid, &boids, 1), vec![0]);
    }

    #[test]
    fn box_not_disc() {
        let p = params(100., 100., 10.);
        // euclidean distance ~14.1, box distance 10
        let boids = at(&[(20., 20.), (30., 30.), (30.5, 20.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(neighbour_ids(&grid, &boids, 0), vec![1]);
    }

    #[rstest]
    #[case::single_bucket(600., 600., 5000., (10., 10.), (500., 500.), 9)]
    #[case::two_by_two_same_cell(100., 100., 50., (10., 10.), (20., 20.), 1)]
    #[case::two_by_two_side(100., 100., 50., (10., 10.), (60., 20.), 2)]
    #[case::two_by_two_diagonal(100., 100., 50., (10., 10.), (60., 60.), 4)]
    #[case::one_by_three(300., 100., 100., (50., 50.), (150., 50.), 3)]
    #[case::three_by_three(300., 300., 100., (50., 50.), (150., 150.), 1)]
    fn narrow_grids_count_repeated_buckets(
        #[case] width: f32,
        #[case] height: f32,
        #[case] radius: f32,
        #[case] a: (f32, f32),
        #[case] b: (f32, f32),
        #[case] times: usize,
    ) {
        let p = params(width, height, radius);
        let boids = at(&[a, b]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(neighbour_ids(&grid, &boids, 0), vec![1; times]);
        assert_eq!(neighbour_ids(&grid, &boids, 1), vec![0; times]);
    }

    #[test]
    fn repeated_neighbours_weight_the_rules() {
        let p = params(100., 100., 50.);
        let boids = at(&[(10., 10.), (20., 20.), (60., 60.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        let mut neighbours = Vec::new();
        grid.collect_neighbours(&boids, 0, boids[0].position, &mut neighbours);

        let ids: Vec<usize> = neighbours.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 2, 1, 2, 2]);

        // centroid (52, 52), not the (40, 40) of the distinct neighbours
        let pull = boids[0].cohesion(&neighbours, 1.);
        assert_relative_eq!(pull.x, -42., epsilon = 1e-3);
        assert_relative_eq!(pull.y, -42., epsilon = 1e-3);
    }

    #[test]
    fn block_wraps_at_the_edges() {
        let grid = SpatialGrid::new(&params(100., 100., 10.));
        assert_eq!(grid.block_around(0, 0), [99, 90, 91, 9, 0, 1, 19, 10, 11]);
    }

    #[test]
    fn single_bucket_block_repeats_it_nine_times() {
        let grid = SpatialGrid::new(&params(600., 600., 5000.));
        assert_eq!(grid.block_around(0, 0), [0; 9]);
    }

    #[test]
    fn two_by_two_block_revisits_buckets_per_offset() {
        let grid = SpatialGrid::new(&params(100., 100., 50.));
        assert_eq!(grid.block_around(0, 0), [3, 2, 3, 1, 0, 1, 3, 2, 3]);
    }

    #[test]
    fn collected_neighbours_outlive_the_grid() {
        let p = params(100., 100., 10.);
        let boids = at(&[(50., 50.), (55., 55.)]);
        let mut neighbours = Vec::new();
        {
            let mut grid = SpatialGrid::new(&p);
            grid.rebuild(&boids);
            grid.collect_neighbours(&boids, 0, boids[0].position, &mut neighbours);
        }

        assert_eq!(neighbours.len(), 1);
        assert_eq!(neighbours[0].id, 1);
    }

    #[test]
    fn out_of_domain_positions_do_not_panic() {
        let p = params(100., 100., 10.);
        let boids = at(&[(-5., 250.), (f32::NAN, 3.), (100., 100.)]);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        assert_eq!(grid.cell_of(Vec2::new(-5., 250.)), (5, 9));
        for index in 0..boids.len() {
            let _ = neighbour_ids(&grid, &boids, index);
        }
    }

    #[test]
    fn neighbourhood_is_symmetric() {
        let p = params(600., 600., 50.);
        let boids = random_flock(800, &p, 5);
        let mut grid = SpatialGrid::new(&p);
        grid.rebuild(&boids);

        let sets: Vec<HashSet<usize>> = (0..boids.len())
            .map(|i| neighbour_ids(&grid, &boids, i).into_iter().collect())
            .collect();

        for (i, set) in sets.iter().enumerate() {
            for &j in set {
                assert!(sets[j].contains(&i), "{i} sees {j} but not the other way round");
            }
        }
    }

    #[rstest]
    #[case(600., 600., 50., 1)]
    #[case(600., 300., 25., 2)]
    #[case(1000., 500., 100., 3)]
    fn matches_brute_force_when_cells_tile_the_domain(
        #[case] width: f32,
        #[case] height: f32,
        #[case] radius: f32,
        #[case] seed: u64,
    ) {
        let p = params(width, height, radius);
        let boids = random_flock(600, &p, seed);

        let mut grid = SpatialGrid::new(&p);
        let mut naive = NaiveTracker::new(&p);
        grid.rebuild(&boids);
        naive.rebuild(&boids);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed + 100);
        let mut from_grid = Vec::new();
        let mut from_naive = Vec::new();

        for index in 0..boids.len() {
            // query from a slightly moved position, as the update does
            let position = boids[index].position
                + Vec2::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let position = crate::math_helpers::wrap_vec(position, &p.domain);

            from_grid.clear();
            from_naive.clear();
            grid.collect_neighbours(&boids, index, position, &mut from_grid);
            naive.collect_neighbours(&boids, index, position, &mut from_naive);

            let mut g: Vec<usize> = from_grid.iter().map(|b| b.id).collect();
            let mut n: Vec<usize> = from_naive.iter().map(|b| b.id).collect();
            g.sort_unstable();
            n.sort_unstable();
            assert_eq!(g, n, "neighbours of {index} differ");

            for b in from_grid.iter() {
                assert!(within_radius(position, b.position, radius, &p.domain));
            }
        }
    }
}
