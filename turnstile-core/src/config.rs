use std::time::Duration as StdDuration;

use chrono::Duration;

/// The configuration of the seating engine
#[derive(Debug, Clone)]
pub struct Config {
    /// How many seconds a seat hold lives before it is recycled
    pub lock_ttl_in_seconds: u64,
    /// How often the expiry sweeper runs, in seconds
    pub sweep_interval_in_seconds: u64,
    /// How many seats a single order may contain
    pub max_seats_per_order: usize,
}

impl Config {
    /// The lifetime of a seat hold
    pub fn lock_ttl(&self) -> Duration {
        Duration::seconds(self.lock_ttl_in_seconds as i64)
    }

    /// How long the expiry sweeper sleeps between runs
    pub fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_interval_in_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Long enough to fill out a checkout form, short enough to recycle abandoned holds
            lock_ttl_in_seconds: 120,
            // Abandoned seats should become visible again quickly
            sweep_interval_in_seconds: 5,
            max_seats_per_order: 10,
        }
    }
}
