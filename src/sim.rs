//! Demo, benchmark, and stress-test runners for the barbershop.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::info;

use crate::config::{DEMO_RUN_MS, ShopConfig};
use crate::error::{ConfigError, ShopError};
use crate::producer::ClientProducer;
use crate::shop::{Shop, ShopReport};
use crate::stats::ShopStats;
use crate::types::{Client, ShopEvent};

const CSV_HEADER: &str = "barbers,seats,clients,served,rejected,rejection_rate,max_waiting,elapsed_ms,throughput_clients_per_s,cpu_user_s,cpu_sys_s,violations";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let seconds = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some((seconds(usage.ru_utime), seconds(usage.ru_stime)))
}

#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Producer, shop, and the channels between them for one run.
struct Run {
    shutdown: Sender<()>,
    producer: JoinHandle<usize>,
    shop: JoinHandle<Result<ShopReport, ShopError>>,
    events: Receiver<ShopEvent>,
    started: Instant,
}

struct RunOutcome {
    produced: usize,
    report: ShopReport,
    stats: ShopStats,
    elapsed: Duration,
}

impl Run {
    fn start(
        config: &ShopConfig,
        limit: Option<usize>,
        seed: Option<u64>,
    ) -> Result<Self, ShopError> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        // Rendezvous: the producer hands each client straight to the shop.
        let (clients_tx, clients_rx) = channel::bounded::<Client>(0);
        let (events_tx, events_rx) = channel::unbounded();

        let started = Instant::now();
        let shop = Shop::new(config.clone(), shutdown_rx.clone())?
            .with_observer(events_tx)
            .spawn(clients_rx)?;

        let mut producer = ClientProducer::new(config);
        if let Some(limit) = limit {
            producer = producer.with_limit(limit);
        }
        if let Some(seed) = seed {
            producer = producer.with_seed(seed);
        }
        let producer = thread::Builder::new()
            .name("producer".to_string())
            .spawn(move || producer.produce(clients_tx, shutdown_rx))
            .map_err(|source| ShopError::Spawn {
                name: "producer".to_string(),
                source,
            })?;

        Ok(Self {
            shutdown: shutdown_tx,
            producer,
            shop,
            events: events_rx,
            started,
        })
    }

    /// Close the shop now; waiting clients are abandoned.
    fn stop(self) -> Result<RunOutcome, ShopError> {
        let Run {
            shutdown,
            producer,
            shop,
            events,
            started,
        } = self;
        drop(shutdown);
        let produced = producer
            .join()
            .map_err(|_| ShopError::Panicked("producer"))?;
        let report = shop.join().map_err(|_| ShopError::Panicked("shop"))??;
        Ok(RunOutcome {
            produced,
            report,
            stats: events.iter().collect(),
            elapsed: started.elapsed(),
        })
    }

    /// Wait for a limited producer to finish and the shop to serve everyone.
    fn finish(self) -> Result<RunOutcome, ShopError> {
        let Run {
            shutdown,
            producer,
            shop,
            events,
            started,
        } = self;
        // Joining the shop first lets it drain; shutdown only releases the producer.
        let report = shop.join().map_err(|_| ShopError::Panicked("shop"))??;
        let elapsed = started.elapsed();
        drop(shutdown);
        let produced = producer
            .join()
            .map_err(|_| ShopError::Panicked("producer"))?;
        Ok(RunOutcome {
            produced,
            report,
            // The observer sender went away with the shop thread.
            stats: events.iter().collect(),
            elapsed,
        })
    }
}

/// Run the default shop (fixed constants) for two seconds and print a summary.
pub fn run_demo() -> Result<(), ShopError> {
    let config = ShopConfig::default();
    info!("demo start");
    let run = Run::start(&config, None, None)?;
    thread::sleep(Duration::from_millis(DEMO_RUN_MS));
    let outcome = run.stop()?;
    info!(
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "demo finished"
    );

    let stats = &outcome.stats;
    let report = &outcome.report;
    println!("DEMO SUMMARY");
    println!(
        "barbers={} hall_seats={} cutting_ms={}",
        config.num_barbers,
        config.num_hall_seats,
        config.cutting_time.as_millis()
    );
    println!("clients_produced={}", outcome.produced);
    println!("arrivals={}", stats.arrivals());
    println!("dispatched={}", stats.dispatched);
    println!("queued={}", stats.queued);
    println!("rejected={}", stats.rejected);
    println!("redispatched={}", stats.redispatched);
    println!("idle={}", stats.idle);
    println!("max_waiting={}", stats.max_waiting);
    println!(
        "barbers_free_at_close={} barbers_busy_at_close={}",
        report.free, report.busy
    );
    println!("abandoned={}", report.abandoned.len());
    println!("interrupted={}", report.interrupted);
    println!("invariant_violations={}", report.violations);
    Ok(())
}

/// Parameters for one benchmark run.
#[derive(Clone, Debug)]
pub struct BenchParams {
    pub barbers: usize,
    pub seats: usize,
    pub clients: usize,
    pub cutting_ms: u64,
    pub validate: bool,
    /// Fixed producer seed for reproducible arrival gaps.
    pub seed: Option<u64>,
}

impl Default for BenchParams {
    fn default() -> Self {
        Self {
            barbers: 2,
            seats: 3,
            clients: 50,
            cutting_ms: 20,
            validate: false,
            seed: None,
        }
    }
}

impl BenchParams {
    fn config(&self) -> ShopConfig {
        ShopConfig {
            cutting_time: Duration::from_millis(self.cutting_ms),
            num_barbers: self.barbers,
            num_hall_seats: self.seats,
            validate: self.validate,
            ..ShopConfig::default()
        }
    }
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    params: BenchParams,
    produced: usize,
    stats: ShopStats,
    elapsed_ms: f64,
    throughput: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    abandoned: usize,
    violations: usize,
    drained: bool,
}

impl BenchResult {
    fn csv_row(&self) -> String {
        let cpu = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NA".to_string());
        format!(
            "{},{},{},{},{},{:.3},{},{:.2},{:.2},{},{},{}",
            self.params.barbers,
            self.params.seats,
            self.produced,
            self.stats.seated(),
            self.stats.rejected,
            self.stats.rejection_rate(),
            self.stats.max_waiting,
            self.elapsed_ms,
            self.throughput,
            cpu(self.cpu_user_s),
            cpu(self.cpu_sys_s),
            self.violations
        )
    }

    fn report_warnings(&self) {
        let accounted = self.stats.seated() + self.stats.rejected;
        if accounted != self.produced || self.abandoned > 0 {
            eprintln!(
                "# warning,unaccounted_clients,{}",
                self.produced.saturating_sub(accounted) + self.abandoned
            );
        }
        if !self.drained {
            eprintln!("# warning,shop_not_drained");
        }
        if self.params.validate && self.violations > 0 {
            eprintln!("# violation,shop_invariants,{}", self.violations);
        }
    }
}

fn benchmark_once(params: &BenchParams) -> Result<BenchResult, ShopError> {
    let config = params.config();
    let cpu_start = cpu_times_seconds();
    let outcome = Run::start(&config, Some(params.clients), params.seed)?.finish()?;

    let elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 {
        outcome.stats.seated() as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    Ok(BenchResult {
        params: params.clone(),
        produced: outcome.produced,
        stats: outcome.stats,
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
        abandoned: outcome.report.abandoned.len(),
        violations: outcome.report.violations,
        drained: outcome.report.drained,
    })
}

fn check_params(params: &BenchParams) -> Result<(), ConfigError> {
    if params.clients == 0 {
        return Err(ConfigError::Zero("clients"));
    }
    params.config().validate()
}

/// Run a single benchmark and print one CSV row.
pub fn run_benchmark(params: BenchParams) -> Result<(), ShopError> {
    check_params(&params)?;
    let result = benchmark_once(&params)?;
    println!("{CSV_HEADER}");
    println!("{}", result.csv_row());
    result.report_warnings();
    Ok(())
}

/// Sweep every combination of the given sets and print CSV output.
pub fn run_stress(
    barber_sets: &[usize],
    seat_sets: &[usize],
    client_sets: &[usize],
    cutting_ms: u64,
    validate: bool,
    seed: Option<u64>,
) -> Result<(), ShopError> {
    let mut combos = Vec::new();
    for &barbers in barber_sets {
        for &seats in seat_sets {
            for &clients in client_sets {
                let params = BenchParams {
                    barbers,
                    seats,
                    clients,
                    cutting_ms,
                    validate,
                    seed,
                };
                check_params(&params)?;
                combos.push(params);
            }
        }
    }

    println!("{CSV_HEADER}");
    for params in combos {
        let result = benchmark_once(&params)?;
        println!("{}", result.csv_row());
        result.report_warnings();
    }
    Ok(())
}
