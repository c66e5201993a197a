mod barber;
mod barber_pool;
mod config;
mod error;
mod logging;
mod producer;
mod shop;
mod sim;
mod stats;
mod types;
mod waiting_room;

use clap::{Parser, Subcommand};

use crate::sim::BenchParams;

/// Sleeping barbers: a bounded waiting-room scheduler.
#[derive(Parser, Debug)]
#[command(name = "barbershop", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the shop with its fixed constants for two seconds (default).
    Demo,
    /// Serve a fixed number of clients once and print a CSV row.
    Bench {
        /// Barbers working (default 2).
        barbers: Option<usize>,
        /// Waiting hall seats (default 3).
        seats: Option<usize>,
        /// Clients the producer sends before closing (default 50).
        clients: Option<usize>,
        /// Duration of one haircut in ms (default 20).
        cutting_ms: Option<u64>,
        /// Check shop invariants after every transition.
        #[arg(long)]
        validate: bool,
        /// Seed the producer for reproducible arrivals.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sweep barber/seat/client sets and print one CSV row per combination.
    Stress {
        #[arg(long, value_delimiter = ',', default_value = "1,2,4")]
        barbers: Vec<usize>,
        #[arg(long, value_delimiter = ',', default_value = "0,3,8")]
        seats: Vec<usize>,
        #[arg(long, value_delimiter = ',', default_value = "50")]
        clients: Vec<usize>,
        #[arg(long, default_value_t = 20)]
        cutting_ms: u64,
        #[arg(long)]
        validate: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Demo);
    // Per-event lines only make sense for the demo; sweeps keep stderr for warnings.
    logging::init(match command {
        Command::Demo => "info",
        Command::Bench { .. } | Command::Stress { .. } => "warn",
    });

    let result = match command {
        Command::Demo => sim::run_demo(),
        Command::Bench {
            barbers,
            seats,
            clients,
            cutting_ms,
            validate,
            seed,
        } => {
            let defaults = BenchParams::default();
            sim::run_benchmark(BenchParams {
                barbers: barbers.unwrap_or(defaults.barbers),
                seats: seats.unwrap_or(defaults.seats),
                clients: clients.unwrap_or(defaults.clients),
                cutting_ms: cutting_ms.unwrap_or(defaults.cutting_ms),
                validate,
                seed,
            })
        }
        Command::Stress {
            barbers,
            seats,
            clients,
            cutting_ms,
            validate,
            seed,
        } => sim::run_stress(&barbers, &seats, &clients, cutting_ms, validate, seed),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "run failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
