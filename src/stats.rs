//! Per-run tallies folded from the shop's event stream.

use crate::types::ShopEvent;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopStats {
    pub dispatched: usize,
    pub queued: usize,
    pub rejected: usize,
    pub redispatched: usize,
    pub idle: usize,
    pub max_waiting: usize,
}

impl ShopStats {
    pub fn record(&mut self, event: &ShopEvent) {
        match *event {
            ShopEvent::Dispatched { .. } => self.dispatched += 1,
            ShopEvent::Queued { waiting, .. } => {
                self.queued += 1;
                self.max_waiting = self.max_waiting.max(waiting);
            }
            ShopEvent::Rejected { .. } => self.rejected += 1,
            ShopEvent::Redispatched { .. } => self.redispatched += 1,
            ShopEvent::Idle { .. } => self.idle += 1,
        }
    }

    /// Clients that reached the shop, whatever happened to them.
    pub fn arrivals(&self) -> usize {
        self.dispatched + self.queued + self.rejected
    }

    /// Clients that got to a barber's chair.
    pub fn seated(&self) -> usize {
        self.dispatched + self.redispatched
    }

    pub fn rejection_rate(&self) -> f64 {
        let arrivals = self.arrivals();
        if arrivals == 0 {
            0.0
        } else {
            self.rejected as f64 / arrivals as f64
        }
    }
}

impl FromIterator<ShopEvent> for ShopStats {
    fn from_iter<I: IntoIterator<Item = ShopEvent>>(events: I) -> Self {
        let mut stats = ShopStats::default();
        for event in events {
            stats.record(&event);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_every_event_kind() {
        let events = [
            ShopEvent::Dispatched {
                barber: 0,
                client: 0,
            },
            ShopEvent::Queued {
                client: 1,
                waiting: 1,
            },
            ShopEvent::Queued {
                client: 2,
                waiting: 2,
            },
            ShopEvent::Rejected { client: 3 },
            ShopEvent::Redispatched {
                barber: 0,
                client: 1,
                waiting: 1,
            },
            ShopEvent::Redispatched {
                barber: 0,
                client: 2,
                waiting: 0,
            },
            ShopEvent::Idle { barber: 0 },
        ];
        let stats: ShopStats = events.into_iter().collect();
        assert_eq!(stats.arrivals(), 4);
        assert_eq!(stats.seated(), 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.max_waiting, 2);
        assert!((stats.rejection_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_run_has_zero_rejection_rate() {
        assert_eq!(ShopStats::default().rejection_rate(), 0.0);
    }
}
