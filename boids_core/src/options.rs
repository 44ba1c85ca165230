use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on `cols * rows` of the neighbourhood grid.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Flat set of named numeric parameters driving one simulation run.
///
/// `population`, `neighbourhood_radius` and `domain` are structural: changing
/// them needs a fresh population and grid. Everything else is picked up by the
/// next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub population: usize,
    /// box-test radius, also the side of one grid cell
    pub neighbourhood_radius: f32,
    /// units per second
    pub max_speed: f32,
    /// units per second per second
    pub max_acceleration: f32,
    /// share of the previous acceleration kept each tick, [0, 1]
    pub acceleration_decay: f32,
    pub weights: RuleWeights,
    pub domain: Domain,
    /// ticks per second, the fixed step is its reciprocal
    pub refresh_rate: f32,
}

impl SimulationParams {
    /// Fixed step length in seconds.
    pub fn dt(&self) -> f32 {
        1. / self.refresh_rate
    }

    /// `(cols, rows)` of the neighbourhood grid, `ceil(size / radius)`, at least 1.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        let cols = (self.domain.width / self.neighbourhood_radius).ceil().max(1.);
        let rows = (self.domain.height / self.neighbourhood_radius).ceil().max(1.);
        (cols as usize, rows as usize)
    }

    /// Fails on the first field a simulation could not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = self.neighbourhood_radius;
        if !(r.is_finite() && r > 0.) {
            return Err(ConfigError::NeighbourhoodRadius(r));
        }
        let Domain { width, height } = self.domain;
        if !(width.is_finite() && width > 0. && height.is_finite() && height > 0.) {
            return Err(ConfigError::Domain { width, height });
        }
        let (cols, rows) = self.grid_dimensions();
        if cols.saturating_mul(rows) > MAX_GRID_CELLS {
            return Err(ConfigError::GridResolution { cols, rows });
        }
        if !(self.max_speed.is_finite() && self.max_speed >= 0.) {
            return Err(ConfigError::MaxSpeed(self.max_speed));
        }
        if !(self.max_acceleration.is_finite() && self.max_acceleration >= 0.) {
            return Err(ConfigError::MaxAcceleration(self.max_acceleration));
        }
        if !(0. ..=1.).contains(&self.acceleration_decay) {
            return Err(ConfigError::AccelerationDecay(self.acceleration_decay));
        }
        if !(self.refresh_rate.is_finite() && self.refresh_rate > 0.) {
            return Err(ConfigError::RefreshRate(self.refresh_rate));
        }
        for (rule, weight) in self.weights.named() {
            if !weight.is_finite() {
                return Err(ConfigError::RuleWeight { rule, weight });
            }
        }
        Ok(())
    }

    /// Classifies the transition from `self` to `next`.
    pub fn change_to(&self, next: &SimulationParams) -> ParamChange {
        if self == next {
            ParamChange::None
        } else if self.population != next.population
            || self.neighbourhood_radius != next.neighbourhood_radius
            || self.domain != next.domain
        {
            ParamChange::Structural
        } else {
            ParamChange::Live
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        let population = 1000;
        let neighbourhood_radius = 50.;
        let max_speed = 300.;
        let max_acceleration = 100.;
        let acceleration_decay = 0.75;
        let refresh_rate = 60.;

        SimulationParams {
            population,
            neighbourhood_radius,
            max_speed,
            max_acceleration,
            acceleration_decay,
            weights: Default::default(),
            domain: Domain::new(600., 600.),
            refresh_rate,
        }
    }
}

/// What a parameter update asks of a running simulation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParamChange {
    None,
    /// applied in place, takes effect next tick
    Live,
    /// population, radius or domain changed, restart needed
    Structural,
}

/// Weights of the three steering rules. The core uses them as given.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleWeights {
    /// rule 1, position relative to the neighbours' centroid
    pub cohesion: f32,
    /// rule 2, velocity matching
    pub alignment: f32,
    /// rule 3, acceleration matching
    pub separation: f32,
}

impl RuleWeights {
    pub fn new(cohesion: f32, alignment: f32, separation: f32) -> Self {
        RuleWeights {
            cohesion,
            alignment,
            separation,
        }
    }

    /// Rescaled to sum to 1, as a control panel presents them.
    ///
    /// Weights summing to zero (or less) come back unchanged.
    pub fn normalized(&self) -> Self {
        let sum = self.cohesion + self.alignment + self.separation;
        if !(sum > 0.) || !sum.is_finite() {
            return *self;
        }
        RuleWeights::new(self.cohesion / sum, self.alignment / sum, self.separation / sum)
    }

    fn named(&self) -> [(&'static str, f32); 3] {
        [
            ("cohesion", self.cohesion),
            ("alignment", self.alignment),
            ("separation", self.separation),
        ]
    }
}

impl Default for RuleWeights {
    fn default() -> Self {
        RuleWeights::new(0.34, 0.33, 0.33)
    }
}

/// Rectangular toroidal domain spanning `[0, width) x [0, height)`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Domain {
    pub width: f32,
    pub height: f32,
}

impl Domain {
    pub fn new(width: f32, height: f32) -> Domain {
        Domain { width, height }
    }
}

impl Default for Domain {
    fn default() -> Self {
        Domain::new(600., 600.)
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("neighbourhood radius must be positive and finite, got {0}")]
    NeighbourhoodRadius(f32),
    #[error("domain must have positive finite size, got {width}x{height}")]
    Domain { width: f32, height: f32 },
    #[error("radius too small for the domain, grid would need {cols}x{rows} cells")]
    GridResolution { cols: usize, rows: usize },
    #[error("max speed must be non-negative and finite, got {0}")]
    MaxSpeed(f32),
    #[error("max acceleration must be non-negative and finite, got {0}")]
    MaxAcceleration(f32),
    #[error("acceleration decay must lie in [0, 1], got {0}")]
    AccelerationDecay(f32),
    #[error("refresh rate must be positive and finite, got {0}")]
    RefreshRate(f32),
    #[error("{rule} weight must be finite, got {weight}")]
    RuleWeight { rule: &'static str, weight: f32 },
}
