//! Shared identifiers and the event model used across the shop.

use std::fmt;

/// Unique identifier for a barber (0-based, fixed at shop startup).
pub type BarberId = u64;
/// Unique identifier for a client, assigned in arrival order by the producer.
pub type ClientId = u64;

/// One arriving client. Carries no payload beyond its identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Client {
    pub id: ClientId,
}

impl Client {
    pub fn new(id: ClientId) -> Self {
        Self { id }
    }
}

/// Completion signal sent by a barber once a haircut is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Finished {
    pub barber: BarberId,
    pub client: ClientId,
}

/// Observable outcome of a single scheduler transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopEvent {
    /// A free barber took the arriving client straight away.
    Dispatched { barber: BarberId, client: ClientId },
    /// No barber was free; the client sat down. `waiting` is the room length afterwards.
    Queued { client: ClientId, waiting: usize },
    /// No barber and no seat; the client left.
    Rejected { client: ClientId },
    /// A barber finished and took the head of the waiting room.
    Redispatched {
        barber: BarberId,
        client: ClientId,
        waiting: usize,
    },
    /// A barber finished with nobody waiting and went back to sleep.
    Idle { barber: BarberId },
}

impl ShopEvent {
    /// Short category name used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ShopEvent::Dispatched { .. } => "dispatched",
            ShopEvent::Queued { .. } => "queued",
            ShopEvent::Rejected { .. } => "rejected",
            ShopEvent::Redispatched { .. } => "redispatched",
            ShopEvent::Idle { .. } => "idle",
        }
    }
}

impl fmt::Display for ShopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopEvent::Dispatched { barber, client } => {
                write!(f, "client {client} goes to barber {barber}")
            }
            ShopEvent::Queued { client, waiting } => {
                write!(f, "client {client} is waiting in hall ({waiting})")
            }
            ShopEvent::Rejected { client } => write!(f, "no free space for client {client}"),
            ShopEvent::Redispatched {
                barber,
                client,
                waiting,
            } => write!(
                f,
                "barber {barber} takes client {client} from room ({waiting})"
            ),
            ShopEvent::Idle { barber } => write!(f, "barber {barber} idle"),
        }
    }
}
