use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    boid::Boid,
    cadence::{TickToken, Ticker},
    flock::Flock,
    options::{ConfigError, ParamChange, SimulationParams},
};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation is not running, call setup first")]
    NotRunning,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SimState {
    Idle,
    Running,
}

/// Owns one run of the flock: its population, grid, randomness and tick source.
///
/// Nothing is global, several simulations can live side by side.
pub struct Simulation {
    rng: Xoshiro256PlusPlus,
    flock: Option<Flock>,
    ticker: Ticker,
    ticks: u64,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Simulation {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            flock: None,
            ticker: Ticker::new(),
            ticks: 0,
        }
    }

    pub fn state(&self) -> SimState {
        match self.flock {
            Some(_) => SimState::Running,
            None => SimState::Idle,
        }
    }

    /// Validates `params`, spawns a fresh population and grid and starts a new
    /// tick source. A running simulation is replaced.
    ///
    /// Nothing changes when validation fails.
    pub fn setup(&mut self, params: &SimulationParams) -> Result<TickToken, SimulationError> {
        if let Err(err) = params.validate() {
            warn!(%err, "rejected simulation parameters");
            return Err(err.into());
        }

        let flock: Flock = Flock::new(params, &mut self.rng);
        let settings = flock.tracker().settings();
        debug!(
            population = flock.len(),
            cols = settings.cols,
            rows = settings.rows,
            "simulation set up"
        );

        self.flock = Some(flock);
        self.ticks = 0;
        Ok(self.ticker.start())
    }

    /// Advances the population by one fixed step.
    pub fn tick(&mut self) -> Result<(), SimulationError> {
        let flock = self.flock.as_mut().ok_or(SimulationError::NotRunning)?;
        flock.update();
        self.ticks += 1;
        Ok(())
    }

    /// Current agents, empty when idle.
    pub fn snapshot(&self) -> &[Boid] {
        match &self.flock {
            Some(flock) => flock.view(),
            None => &[],
        }
    }

    pub fn params(&self) -> Option<&SimulationParams> {
        self.flock.as_ref().map(|flock| flock.params())
    }

    /// Applies new parameters. Live changes land in place and keep the tick
    /// source; structural ones rebuild the run and issue a new token, which
    /// [`Simulation::token`] then returns.
    pub fn reconfigure(&mut self, params: &SimulationParams) -> Result<ParamChange, SimulationError> {
        if let Err(err) = params.validate() {
            warn!(%err, "rejected parameter update");
            return Err(err.into());
        }

        let flock = self.flock.as_mut().ok_or(SimulationError::NotRunning)?;
        let change = flock.params().change_to(params);

        match change {
            ParamChange::None => {}
            ParamChange::Live => {
                debug!("live parameter update");
                flock.set_live_params(params);
            }
            ParamChange::Structural => {
                debug!("structural parameter update, restarting");
                self.teardown();
                self.setup(params)?;
            }
        }

        Ok(change)
    }

    /// Fresh population with the current parameters.
    pub fn restart(&mut self) -> Result<TickToken, SimulationError> {
        let params = self.params().cloned().ok_or(SimulationError::NotRunning)?;
        self.teardown();
        self.setup(&params)
    }

    /// Drops the population and cancels the tick source. Idempotent.
    pub fn teardown(&mut self) {
        if self.flock.take().is_some() {
            debug!(ticks = self.ticks, "simulation torn down");
        }
        self.ticker.cancel();
    }

    /// Ticks since the last setup.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Token of the active tick source, if running.
    pub fn token(&self) -> Option<&TickToken> {
        self.ticker.current()
    }
}
