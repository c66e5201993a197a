//! Client producer: one arrival every 7..=34ms (by default) until told to stop.

use std::ops::RangeInclusive;
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ShopConfig;
use crate::types::{Client, ClientId};

pub struct ClientProducer {
    arrival_ms: RangeInclusive<u64>,
    limit: Option<usize>,
    rng: StdRng,
}

impl ClientProducer {
    pub fn new(config: &ShopConfig) -> Self {
        Self {
            arrival_ms: config.arrival_range_ms(),
            limit: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Stop after `limit` clients instead of running until shutdown.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fixed seed for reproducible arrival gaps.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn next_gap(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.arrival_ms.clone()))
    }

    /// Emit clients until shutdown, the limit, or the shop hanging up.
    /// Returns how many clients were delivered.
    pub fn produce(mut self, clients: Sender<Client>, shutdown: Receiver<()>) -> usize {
        let mut next_id: ClientId = 0;
        loop {
            if self.limit.is_some_and(|limit| next_id as usize >= limit) {
                debug!(produced = next_id, "producer reached its limit");
                break;
            }
            let gap = self.next_gap();
            crossbeam::channel::select! {
                recv(shutdown) -> _ => break,
                default(gap) => {},
            }
            let client = Client::new(next_id);
            crossbeam::channel::select! {
                send(clients, client) -> sent => {
                    if sent.is_err() {
                        debug!("shop closed its door, producer stops");
                        break;
                    }
                },
                recv(shutdown) -> _ => break,
            }
            next_id += 1;
        }
        next_id as usize
    }
}
