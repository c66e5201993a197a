//! The shop scheduler: sole owner of the barber pool and the waiting room.
//!
//! `ShopState` holds the pure admission/dispatch transitions. `Shop` wraps it
//! in a single-threaded event loop that selects over arrivals, completions and
//! shutdown, and runs every haircut on its own barber thread.

use std::collections::HashMap;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::barber::cut_hair;
use crate::barber_pool::BarberPool;
use crate::config::ShopConfig;
use crate::error::{InvariantViolation, ShopError};
use crate::types::{BarberId, Client, ClientId, Finished, ShopEvent};
use crate::waiting_room::WaitingRoom;

/// Barbers and hall seats, plus the two transitions that move between them.
#[derive(Debug)]
pub struct ShopState {
    pool: BarberPool,
    room: WaitingRoom,
}

impl ShopState {
    pub fn new(num_barbers: usize, num_hall_seats: usize) -> Self {
        Self {
            pool: BarberPool::new(num_barbers),
            room: WaitingRoom::new(num_hall_seats),
        }
    }

    pub fn from_config(config: &ShopConfig) -> Self {
        Self::new(config.num_barbers, config.num_hall_seats)
    }

    /// Admission control for one arriving client.
    pub fn arrive(&mut self, client: Client) -> ShopEvent {
        if let Some(barber) = self.pool.take(client.id) {
            return ShopEvent::Dispatched {
                barber,
                client: client.id,
            };
        }
        match self.room.admit(client) {
            Ok(waiting) => ShopEvent::Queued {
                client: client.id,
                waiting,
            },
            Err(client) => ShopEvent::Rejected { client: client.id },
        }
    }

    /// A barber finished. `None` if that barber was not cutting.
    pub fn finish(&mut self, barber: BarberId) -> Option<ShopEvent> {
        self.pool.serving(barber)?;
        match self.room.call_next() {
            Some(client) => {
                self.pool.reassign(barber, client.id);
                Some(ShopEvent::Redispatched {
                    barber,
                    client: client.id,
                    waiting: self.room.len(),
                })
            }
            None => {
                self.pool.release(barber);
                Some(ShopEvent::Idle { barber })
            }
        }
    }

    pub fn check(&self) -> Result<(), InvariantViolation> {
        self.pool.check()?;
        if self.room.len() > self.room.capacity() {
            return Err(InvariantViolation::RoomOverflow {
                len: self.room.len(),
                capacity: self.room.capacity(),
            });
        }
        Ok(())
    }

    /// Every barber asleep and nobody waiting.
    pub fn is_quiet(&self) -> bool {
        self.pool.busy_count() == 0 && self.room.is_empty()
    }

    /// Send everyone still waiting home.
    pub fn abandon(&mut self) -> Vec<Client> {
        self.room.clear()
    }

    pub fn free_barbers(&self) -> usize {
        self.pool.free_count()
    }

    pub fn busy_barbers(&self) -> usize {
        self.pool.busy_count()
    }

    pub fn waiting(&self) -> usize {
        self.room.len()
    }
}

/// Final state of a shop run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopReport {
    pub free: usize,
    pub busy: usize,
    /// Clients still in the waiting room when the shop closed.
    pub abandoned: Vec<ClientId>,
    /// Haircuts cancelled before they could report completion.
    pub interrupted: usize,
    pub violations: usize,
    /// True when the shop closed because arrivals ended and all work finished.
    pub drained: bool,
}

/// Threaded scheduler around `ShopState`.
///
/// Stops when `shutdown` disconnects (drop every sender), or once the arrival
/// channel disconnects and the last haircut is done.
pub struct Shop {
    config: ShopConfig,
    state: ShopState,
    cuts: HashMap<BarberId, JoinHandle<bool>>,
    shutdown: Receiver<()>,
    events: Option<Sender<ShopEvent>>,
    violations: usize,
}

impl Shop {
    pub fn new(config: ShopConfig, shutdown: Receiver<()>) -> Result<Self, ShopError> {
        config.validate()?;
        let state = ShopState::from_config(&config);
        Ok(Self {
            cuts: HashMap::with_capacity(config.num_barbers),
            config,
            state,
            shutdown,
            events: None,
            violations: 0,
        })
    }

    /// Forward every transition to `events` as well as the log.
    pub fn with_observer(mut self, events: Sender<ShopEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run the event loop on a dedicated `shop` thread.
    pub fn spawn(
        self,
        clients: Receiver<Client>,
    ) -> Result<JoinHandle<Result<ShopReport, ShopError>>, ShopError> {
        thread::Builder::new()
            .name("shop".to_string())
            .spawn(move || self.run(clients))
            .map_err(|source| ShopError::Spawn {
                name: "shop".to_string(),
                source,
            })
    }

    pub fn run(mut self, clients: Receiver<Client>) -> Result<ShopReport, ShopError> {
        let (finished_tx, finished_rx) = channel::unbounded::<Finished>();
        let shutdown = self.shutdown.clone();
        let closed = channel::never::<Client>();
        let mut arrivals_open = true;
        let mut drained = false;
        info!(
            barbers = self.config.num_barbers,
            seats = self.config.num_hall_seats,
            cutting_ms = self.config.cutting_time.as_millis() as u64,
            "shop open"
        );

        loop {
            if !arrivals_open && self.state.is_quiet() {
                debug!("no more arrivals and all barbers asleep");
                drained = true;
                break;
            }
            let arrivals = if arrivals_open { &clients } else { &closed };
            crossbeam::channel::select! {
                recv(arrivals) -> msg => {
                    match msg {
                        Ok(client) => {
                            let event = self.state.arrive(client);
                            self.apply(event, &finished_tx)?;
                        }
                        Err(_) => {
                            debug!("arrivals closed, finishing remaining work");
                            arrivals_open = false;
                        }
                    }
                },
                recv(finished_rx) -> msg => {
                    if let Ok(done) = msg {
                        self.on_finished(done, &finished_tx)?;
                    }
                },
                recv(shutdown) -> _ => {
                    info!("shutdown requested");
                    break;
                },
            }
        }

        self.close(drained)
    }

    fn on_finished(&mut self, done: Finished, finished: &Sender<Finished>) -> Result<(), ShopError> {
        // The barber thread exits right after reporting.
        if let Some(handle) = self.cuts.remove(&done.barber) {
            handle.join().map_err(|_| ShopError::Panicked("barber"))?;
        }
        match self.state.finish(done.barber) {
            Some(event) => self.apply(event, finished),
            None => {
                self.record(InvariantViolation::UnexpectedFinish(done.barber));
                Ok(())
            }
        }
    }

    fn apply(&mut self, event: ShopEvent, finished: &Sender<Finished>) -> Result<(), ShopError> {
        info!(kind = event.kind(), "{event}");
        if let Some(events) = &self.events {
            // A departed observer must not stop the shop.
            let _ = events.send(event);
        }
        match event {
            ShopEvent::Dispatched { barber, client }
            | ShopEvent::Redispatched { barber, client, .. } => {
                self.start_cut(barber, Client::new(client), finished)?;
            }
            ShopEvent::Queued { .. } | ShopEvent::Rejected { .. } | ShopEvent::Idle { .. } => {}
        }
        if self.config.validate {
            if let Err(violation) = self.state.check() {
                self.record(violation);
            }
        }
        Ok(())
    }

    fn start_cut(
        &mut self,
        barber: BarberId,
        client: Client,
        finished: &Sender<Finished>,
    ) -> Result<(), ShopError> {
        if self.cuts.contains_key(&barber) {
            self.record(InvariantViolation::DoubleDispatch(barber));
        }
        let name = format!("barber-{barber}");
        let cutting_time = self.config.cutting_time;
        let finished = finished.clone();
        let shutdown = self.shutdown.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || cut_hair(barber, client, cutting_time, finished, shutdown))
            .map_err(|source| ShopError::Spawn { name, source })?;
        self.cuts.insert(barber, handle);
        Ok(())
    }

    fn record(&mut self, violation: InvariantViolation) {
        error!(%violation, "shop invariant violated");
        self.violations += 1;
    }

    fn close(mut self, drained: bool) -> Result<ShopReport, ShopError> {
        let mut interrupted = 0;
        for (_, handle) in self.cuts.drain() {
            let reported = handle.join().map_err(|_| ShopError::Panicked("barber"))?;
            if !reported {
                interrupted += 1;
            }
        }
        let busy = self.state.busy_barbers();
        let free = self.state.free_barbers();
        debug!(free, busy, waiting = self.state.waiting(), "final shop state");
        let abandoned: Vec<ClientId> = self.state.abandon().into_iter().map(|c| c.id).collect();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "clients left waiting when the shop closed");
        }
        info!(drained, interrupted, violations = self.violations, "shop closed");
        Ok(ShopReport {
            free,
            busy,
            abandoned,
            interrupted,
            violations: self.violations,
            drained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use std::time::Duration;

    fn clients(ids: std::ops::Range<u64>) -> impl Iterator<Item = Client> {
        ids.map(Client::new)
    }

    #[test]
    fn single_barber_fills_the_hall() {
        let mut state = ShopState::new(1, 3);
        let events: Vec<ShopEvent> = clients(0..4).map(|c| state.arrive(c)).collect();
        assert_eq!(
            events,
            vec![
                ShopEvent::Dispatched {
                    barber: 0,
                    client: 0
                },
                ShopEvent::Queued {
                    client: 1,
                    waiting: 1
                },
                ShopEvent::Queued {
                    client: 2,
                    waiting: 2
                },
                ShopEvent::Queued {
                    client: 3,
                    waiting: 3
                },
            ]
        );
        assert_eq!(state.waiting(), 3);
    }

    #[test]
    fn no_seats_means_rejection() {
        let mut state = ShopState::new(1, 0);
        let kinds: Vec<&str> = clients(0..2).map(|c| state.arrive(c).kind()).collect();
        assert_eq!(kinds, vec!["dispatched", "rejected"]);
        assert_eq!(state.waiting(), 0);
    }

    #[test]
    fn full_hall_turns_clients_away() {
        let mut state = ShopState::new(1, 1);
        state.arrive(Client::new(0));
        state.arrive(Client::new(1));
        assert_eq!(
            state.arrive(Client::new(2)),
            ShopEvent::Rejected { client: 2 }
        );
        assert_eq!(state.waiting(), 1);
    }

    #[test]
    fn two_free_barbers_both_dispatch() {
        let mut state = ShopState::new(2, 3);
        let barbers: HashSet<BarberId> = clients(0..2)
            .map(|c| match state.arrive(c) {
                ShopEvent::Dispatched { barber, .. } => barber,
                other => panic!("expected dispatch, got {other:?}"),
            })
            .collect();
        assert_eq!(barbers.len(), 2);
        assert_eq!(state.free_barbers(), 0);
    }

    #[test]
    fn finishing_with_empty_hall_goes_idle() {
        let mut state = ShopState::new(1, 3);
        state.arrive(Client::new(0));
        assert_eq!(state.finish(0), Some(ShopEvent::Idle { barber: 0 }));
        assert_eq!(state.free_barbers(), 1);
        assert_eq!(state.busy_barbers(), 0);
        assert!(state.is_quiet());
    }

    #[test]
    fn finishing_with_waiting_clients_takes_the_head() {
        let mut state = ShopState::new(1, 3);
        for client in clients(0..3) {
            state.arrive(client);
        }
        assert_eq!(state.waiting(), 2);
        assert_eq!(
            state.finish(0),
            Some(ShopEvent::Redispatched {
                barber: 0,
                client: 1,
                waiting: 1
            })
        );
        assert_eq!(state.waiting(), 1);
        assert_eq!(state.busy_barbers(), 1);
        assert_eq!(state.free_barbers(), 0);
    }

    #[test]
    fn finish_from_sleeping_barber_is_ignored() {
        let mut state = ShopState::new(2, 1);
        assert_eq!(state.finish(1), None);
        assert_eq!(state.free_barbers(), 2);
    }

    #[test]
    fn random_traffic_keeps_invariants_and_fifo() {
        let barbers = 3;
        let seats = 4;
        let mut state = ShopState::new(barbers, seats);
        let mut rng = StdRng::seed_from_u64(2432);
        let mut cutting: Vec<BarberId> = Vec::new();
        let mut next_client = 0;
        let mut last_seated: Option<ClientId> = None;
        let mut queued_order: Vec<ClientId> = Vec::new();

        for _ in 0..5_000 {
            let event = if cutting.is_empty() || rng.gen_bool(0.55) {
                let client = Client::new(next_client);
                next_client += 1;
                state.arrive(client)
            } else {
                let barber = cutting.swap_remove(rng.gen_range(0..cutting.len()));
                state.finish(barber).expect("barber was cutting")
            };
            match event {
                ShopEvent::Dispatched { barber, .. } => {
                    assert!(!cutting.contains(&barber), "double dispatch");
                    cutting.push(barber);
                }
                ShopEvent::Redispatched { barber, client, .. } => {
                    assert!(!cutting.contains(&barber), "double dispatch");
                    cutting.push(barber);
                    // Waiting clients leave the hall in admission order.
                    assert_eq!(queued_order.first(), Some(&client));
                    queued_order.remove(0);
                    if let Some(prev) = last_seated {
                        assert!(client > prev);
                    }
                    last_seated = Some(client);
                }
                ShopEvent::Queued { client, .. } => queued_order.push(client),
                ShopEvent::Rejected { .. } | ShopEvent::Idle { .. } => {}
            }
            assert!(state.check().is_ok());
            assert!(state.waiting() <= seats);
            assert_eq!(state.free_barbers() + state.busy_barbers(), barbers);
            assert_eq!(state.busy_barbers(), cutting.len());
        }
    }

    fn test_config(barbers: usize, seats: usize, cutting_ms: u64) -> ShopConfig {
        ShopConfig {
            cutting_time: Duration::from_millis(cutting_ms),
            num_barbers: barbers,
            num_hall_seats: seats,
            validate: true,
            ..ShopConfig::default()
        }
    }

    #[test]
    fn zero_barbers_cannot_open() {
        let (_shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let result = Shop::new(test_config(0, 3, 20), shutdown_rx);
        assert!(matches!(
            result,
            Err(ShopError::Config(ConfigError::NoBarbers))
        ));
    }

    #[test]
    fn shutdown_abandons_waiting_clients_and_cancels_cuts() {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let (events_tx, events_rx) = channel::unbounded();
        let (clients_tx, clients_rx) = channel::unbounded();
        // Long haircut so no completion races the arrivals.
        let shop = Shop::new(test_config(1, 3, 30_000), shutdown_rx)
            .expect("valid config")
            .with_observer(events_tx);
        let handle = shop.spawn(clients_rx).expect("spawn shop");

        for client in clients(0..4) {
            clients_tx.send(client).expect("shop open");
        }
        let kinds: Vec<&str> = (0..4)
            .map(|_| {
                events_rx
                    .recv_timeout(Duration::from_secs(1))
                    .expect("shop event")
                    .kind()
            })
            .collect();
        assert_eq!(kinds, vec!["dispatched", "queued", "queued", "queued"]);

        drop(shutdown_tx);
        let report = handle
            .join()
            .expect("shop thread panicked")
            .expect("shop run failed");
        assert_eq!(report.abandoned, vec![1, 2, 3]);
        assert_eq!(report.interrupted, 1);
        assert_eq!(report.busy, 1);
        assert_eq!(report.violations, 0);
        assert!(!report.drained);
    }

    #[test]
    fn closing_arrivals_drains_the_hall() {
        let (_shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let (events_tx, events_rx) = channel::unbounded();
        let (clients_tx, clients_rx) = channel::unbounded();
        let shop = Shop::new(test_config(1, 1, 20), shutdown_rx)
            .expect("valid config")
            .with_observer(events_tx);

        clients_tx.send(Client::new(0)).expect("send");
        clients_tx.send(Client::new(1)).expect("send");
        drop(clients_tx);

        let report = shop.run(clients_rx).expect("shop run failed");
        let events: Vec<ShopEvent> = events_rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ShopEvent::Dispatched {
                    barber: 0,
                    client: 0
                },
                ShopEvent::Queued {
                    client: 1,
                    waiting: 1
                },
                ShopEvent::Redispatched {
                    barber: 0,
                    client: 1,
                    waiting: 0
                },
                ShopEvent::Idle { barber: 0 },
            ]
        );
        assert!(report.drained);
        assert!(report.abandoned.is_empty());
        assert_eq!(report.interrupted, 0);
        assert_eq!(report.free, 1);
        assert_eq!(report.busy, 0);
    }

    #[test]
    fn departed_observer_does_not_stop_the_shop() {
        let (_shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let (events_tx, events_rx) = channel::unbounded();
        let (clients_tx, clients_rx) = channel::unbounded();
        drop(events_rx);
        let shop = Shop::new(test_config(2, 0, 5), shutdown_rx)
            .expect("valid config")
            .with_observer(events_tx);
        for client in clients(0..3) {
            clients_tx.send(client).expect("send");
        }
        drop(clients_tx);
        let report = shop.run(clients_rx).expect("shop run failed");
        assert!(report.drained);
        assert_eq!(report.free, 2);
    }
}
