use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::options::ConfigError;

/// Fixed-step schedule driven by an external, monotonically increasing clock.
///
/// The step the simulation integrates with never depends on the clock; the
/// clock only decides when the next step is due. At most one step is due per
/// poll and intervals missed while the host was busy are dropped, not replayed.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_due: Duration,
}

impl Cadence {
    pub fn new(refresh_rate: f32) -> Result<Self, ConfigError> {
        if !(refresh_rate.is_finite() && refresh_rate > 0.) {
            return Err(ConfigError::RefreshRate(refresh_rate));
        }
        let interval = Duration::from_secs_f64(1. / refresh_rate as f64);

        Ok(Cadence {
            interval,
            next_due: interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a step is due at `elapsed`. Consumes the step if so.
    pub fn poll(&mut self, elapsed: Duration) -> bool {
        if elapsed < self.next_due {
            return false;
        }

        self.next_due += self.interval;
        if self.next_due <= elapsed {
            // fell behind, resync instead of bursting
            self.next_due = elapsed + self.interval;
        }
        true
    }

    /// Restarts the schedule so the first step is due one interval after `elapsed`.
    pub fn reset(&mut self, elapsed: Duration) {
        self.next_due = elapsed + self.interval;
    }
}

impl Default for Cadence {
    /// 60 steps per second.
    fn default() -> Self {
        let interval = Duration::from_secs_f64(1. / 60.);
        Cadence {
            interval,
            next_due: interval,
        }
    }
}

/// Hands out cancellation tokens for the periodic tick source.
///
/// Starting a new source cancels the previous one, so no two sources are ever
/// active together.
#[derive(Debug, Default)]
pub struct Ticker {
    generation: u64,
    current: Option<TickToken>,
}

/// Shared flag a tick source checks before every tick.
#[derive(Debug, Clone)]
pub struct TickToken {
    generation: u64,
    active: Arc<AtomicBool>,
}

impl Ticker {
    pub fn new() -> Self {
        Default::default()
    }

    /// Cancels the active token, if any, and issues a fresh one.
    pub fn start(&mut self) -> TickToken {
        self.cancel();
        self.generation += 1;

        let token = TickToken {
            generation: self.generation,
            active: Arc::new(AtomicBool::new(true)),
        };
        self.current = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    pub fn current(&self) -> Option<&TickToken> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl TickToken {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
