//! Whole-round time limit.

use std::time::Duration;

use loop_defence_core::Lifecycle;

/// Countdown over the whole round, independent of individual waves.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundTimer {
    limit: f32,
    elapsed: f32,
    running: bool,
}

impl RoundTimer {
    /// Creates a stopped timer with a limit in seconds.
    #[must_use]
    pub fn new(limit: f32) -> Self {
        Self {
            limit: limit.max(0.0),
            elapsed: 0.0,
            running: false,
        }
    }

    /// Starts counting from zero.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Stops counting without losing the elapsed time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continues counting after a pause.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Advances the timer; returns `true` on the tick the limit is reached.
    pub fn update(&mut self, dt: Duration) -> bool {
        if !self.running || self.expired() {
            return false;
        }
        self.elapsed = (self.elapsed + dt.as_secs_f32()).min(self.limit);
        self.expired()
    }

    /// Reports whether the limit was reached.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.elapsed >= self.limit
    }

    /// Seconds left before the limit.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.limit - self.elapsed).max(0.0)
    }

    /// Seconds counted so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether the timer is counting.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Lifecycle for RoundTimer {
    fn initialize(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }

    fn teardown(&mut self) {
        self.initialize();
    }
}
