//! Bounded FIFO of clients waiting for a barber.
//!
//! Owned by the scheduler thread only, so no synchronization is needed.

use std::collections::VecDeque;

use crate::types::Client;

/// Hall seats in arrival order.
#[derive(Debug)]
pub struct WaitingRoom {
    seats: VecDeque<Client>,
    capacity: usize,
}

impl WaitingRoom {
    /// Create an empty room with `capacity` seats (zero is allowed).
    pub fn new(capacity: usize) -> Self {
        Self {
            seats: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Seat a client at the tail; returns the client back if every seat is taken.
    /// On success yields the room length after seating.
    pub fn admit(&mut self, client: Client) -> Result<usize, Client> {
        if self.is_full() {
            return Err(client);
        }
        self.seats.push_back(client);
        Ok(self.seats.len())
    }

    /// Take the longest-waiting client.
    pub fn call_next(&mut self) -> Option<Client> {
        self.seats.pop_front()
    }

    /// Empty the room, returning whoever was still waiting.
    pub fn clear(&mut self) -> Vec<Client> {
        self.seats.drain(..).collect()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
