use thiserror::Error;

use crate::types::BarberId;

/// Rejected run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("barbers must be > 0")]
    NoBarbers,

    #[error("arrival interval is inverted: min={min_ms}ms > max={max_ms}ms")]
    InvertedArrivalRange { min_ms: u64, max_ms: u64 },

    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Broken shop invariant, reported when validation is enabled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("barber accounting drifted: free={free} busy={busy} total={total}")]
    BarberCount {
        free: usize,
        busy: usize,
        total: usize,
    },

    #[error("waiting room overflow: len={len} capacity={capacity}")]
    RoomOverflow { len: usize, capacity: usize },

    #[error("barber {0} dispatched while already busy")]
    DoubleDispatch(BarberId),

    #[error("barber {0} is both free and busy")]
    FreeAndBusy(BarberId),

    #[error("completion from barber {0} which was not cutting")]
    UnexpectedFinish(BarberId),
}

/// Errors surfaced by a shop run.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}
