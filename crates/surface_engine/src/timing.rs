//! Tick pacing and rate statistics

use std::time::{Duration, Instant};

/// Timer driving the run loop cadence
///
/// `update` marks the start of a tick; `next_deadline` gives the instant the
/// loop should wake for the following tick.
pub struct TickTimer {
    last_tick: Instant,
    delta: f32,
    total: f32,
    ticks: u64,
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickTimer {
    /// Create a timer; the first tick measures from now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: 0.0,
            total: 0.0,
            ticks: 0,
        }
    }

    /// Mark the start of a tick
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_tick).as_secs_f32();
        self.total += self.delta;
        self.last_tick = now;
        self.ticks += 1;
    }

    /// Instant at which the next tick is due
    pub fn next_deadline(&self, interval: Duration) -> Instant {
        self.last_tick + interval
    }

    /// Seconds since the previous tick
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Average tick rate since creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_rate(&self) -> f32 {
        if self.total > 0.0 {
            self.ticks as f32 / self.total
        } else {
            0.0
        }
    }
}
