use std::mem;

use serde::Serialize;

use crate::boid::Boid;

/// One sampled agent state.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoidData {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// index of the sample this record belongs to, starting at 1
    pub time: u64,
}

// in-memory only, whoever pops the data decides where it goes
pub struct Recorder {
    records: Vec<BoidData>,
    ticks_seen: u64,
    sample_rate: u64,
}

impl Recorder {
    /// Samples every `sample_rate` ticks. A rate of 0 is treated as 1.
    pub fn new(sample_rate: u64) -> Self {
        Recorder {
            records: Vec::new(),
            ticks_seen: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Call once per tick; copies the population when a sample is due.
    pub fn watch(&mut self, boids: &[Boid]) {
        if !self.should_sample() {
            return;
        }

        let time = self.ticks_seen / self.sample_rate;
        self.records.extend(boids.iter().map(|b| BoidData {
            id: b.id,
            x: b.position.x,
            y: b.position.y,
            vx: b.velocity.x,
            vy: b.velocity.y,
            time,
        }));
    }

    pub fn restart(&mut self) {
        self.records.clear();
        self.ticks_seen = 0;
    }

    /// Hands over everything recorded so far, leaving the recorder empty.
    pub fn pop_data(&mut self) -> Vec<BoidData> {
        mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn should_sample(&mut self) -> bool {
        self.ticks_seen += 1;
        self.ticks_seen % self.sample_rate == 0
    }
}
