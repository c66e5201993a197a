//! Fixed shop constants and the per-run configuration built from them.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::ConfigError;

/// Duration of one haircut.
pub const CUTTING_TIME_MS: u64 = 20;
/// Barbers working in the shop.
pub const NUM_BARBERS: usize = 1;
/// Seats in the waiting hall.
pub const NUM_HALL_SEATS: usize = 3;
// Producer sleeps a uniform 7..=34ms between clients.
pub const ARRIVAL_MIN_MS: u64 = 7;
pub const ARRIVAL_MAX_MS: u64 = 34;
/// Wall-clock length of the default demo.
pub const DEMO_RUN_MS: u64 = 2_000;

/// Limits and timings for one shop run. Fixed once the run starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopConfig {
    pub cutting_time: Duration,
    pub num_barbers: usize,
    pub num_hall_seats: usize,
    pub arrival_min: Duration,
    pub arrival_max: Duration,
    /// Check every invariant after each transition.
    pub validate: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            cutting_time: Duration::from_millis(CUTTING_TIME_MS),
            num_barbers: NUM_BARBERS,
            num_hall_seats: NUM_HALL_SEATS,
            arrival_min: Duration::from_millis(ARRIVAL_MIN_MS),
            arrival_max: Duration::from_millis(ARRIVAL_MAX_MS),
            validate: cfg!(debug_assertions),
        }
    }
}

impl ShopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_barbers == 0 {
            return Err(ConfigError::NoBarbers);
        }
        if self.arrival_min > self.arrival_max {
            return Err(ConfigError::InvertedArrivalRange {
                min_ms: self.arrival_min.as_millis() as u64,
                max_ms: self.arrival_max.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Arrival interval in whole milliseconds, as sampled by the producer.
    pub fn arrival_range_ms(&self) -> RangeInclusive<u64> {
        (self.arrival_min.as_millis() as u64)..=(self.arrival_max.as_millis() as u64)
    }
}
