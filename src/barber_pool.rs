//! Free/busy bookkeeping for the shop's barbers.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::error::InvariantViolation;
use crate::types::{BarberId, ClientId};

/// Fixed set of barbers split into free and busy.
///
/// Free barbers are handed out lowest id first, so runs are reproducible.
#[derive(Debug)]
pub struct BarberPool {
    free: BTreeSet<BarberId>,
    busy: HashMap<BarberId, ClientId>,
    total: usize,
}

impl BarberPool {
    /// Create `total` barbers, all free.
    pub fn new(total: usize) -> Self {
        Self {
            free: (0..total as BarberId).collect(),
            busy: HashMap::with_capacity(total),
            total,
        }
    }

    /// Wake the lowest free barber and assign it to `client`.
    pub fn take(&mut self, client: ClientId) -> Option<BarberId> {
        let barber = self.free.pop_first()?;
        self.busy.insert(barber, client);
        Some(barber)
    }

    /// Hand a busy barber its next client without passing through free.
    pub fn reassign(&mut self, barber: BarberId, client: ClientId) -> bool {
        match self.busy.get_mut(&barber) {
            Some(current) => {
                *current = client;
                true
            }
            None => {
                warn!(barber, client, "reassign on a barber that is not busy");
                debug_assert!(false, "reassign on idle barber: barber={barber}");
                false
            }
        }
    }

    /// Send a busy barber back to sleep.
    pub fn release(&mut self, barber: BarberId) -> bool {
        if self.busy.remove(&barber).is_none() {
            warn!(barber, "release on a barber that is not busy");
            debug_assert!(false, "release on idle barber: barber={barber}");
            return false;
        }
        self.free.insert(barber);
        true
    }

    /// Client the barber is currently serving, if busy.
    pub fn serving(&self, barber: BarberId) -> Option<ClientId> {
        self.busy.get(&barber).copied()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    /// Verify free and busy partition the barbers exactly.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        if let Some(&barber) = self.busy.keys().find(|b| self.free.contains(b)) {
            return Err(InvariantViolation::FreeAndBusy(barber));
        }
        if self.free.len() + self.busy.len() != self.total {
            return Err(InvariantViolation::BarberCount {
                free: self.free.len(),
                busy: self.busy.len(),
                total: self.total,
            });
        }
        Ok(())
    }
}
