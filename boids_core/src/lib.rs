use options::SimulationParams;
use recorder::{BoidData, Recorder};
use simulation::{Simulation, SimulationError};

pub mod boid;
pub mod cadence;
pub mod flock;

pub mod math_helpers;
pub mod options;
pub mod recorder;
pub mod simulation;

/// Runs `no_iter` ticks without a surface and returns every sampled record.
pub fn run_headless(
    no_iter: u64,
    params: &SimulationParams,
    seed: u64,
    sample_rate: u64,
) -> Result<Vec<BoidData>, SimulationError> {
    let mut sim = Simulation::new(seed);
    let token = sim.setup(params)?;
    let mut recorder = Recorder::new(sample_rate);

    for _ in 0..no_iter {
        if !token.is_active() {
            break;
        }
        sim.tick()?;
        recorder.watch(sim.snapshot());
    }

    let data = recorder.pop_data();
    sim.teardown();

    Ok(data)
}
