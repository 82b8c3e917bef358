//! Console front end for the marketplace
//!
//! Reads one command per line from stdin and wires the engine to the JSON
//! file store, the console presentation layer and a manually set location.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use shared::logging::{self, Component};
use shared::{market_info, market_warn, Coordinate, NotificationMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use marketplace::commands::HELP;
use marketplace::services::{ConsoleNotifier, JsonFileStore, ManualLocationProvider, SystemClock};
use marketplace::{parse_command, MarketCommand, MarketConfig, Marketplace, Notifier};

/// Local marketplace simulator
#[derive(Parser)]
#[command(name = "marketplace")]
#[command(about = "Connects customers to nearby vendors, with orders and proximity alerts")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Snapshot file (overrides MARKET_STATE_PATH)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Proximity radius in km (overrides MARKET_RADIUS_KM)
    #[arg(long)]
    pub radius: Option<f64>,

    /// popup or browser (overrides MARKET_NOTIFICATION_MODE)
    #[arg(long)]
    pub notify: Option<NotificationMode>,

    /// Seconds between proximity scans
    #[arg(long)]
    pub scan_interval: Option<u64>,

    /// Deliver platform notifications instead of failing over to toasts
    #[arg(long)]
    pub platform_notifications: bool,

    /// Initial device location as lat,lng
    #[arg(long)]
    pub location: Option<Coordinate>,

    /// Seed demo vendors when the catalog is empty
    #[arg(long)]
    pub demo: bool,
}

impl Args {
    fn apply(&self, config: &mut MarketConfig) {
        if let Some(path) = &self.state {
            config.state_path = path.clone();
        }
        if let Some(radius) = self.radius {
            config.proximity_radius_km = radius;
        }
        if let Some(mode) = self.notify {
            config.notification_mode = mode;
        }
        if let Some(secs) = self.scan_interval {
            config.scan_interval = std::time::Duration::from_secs(secs);
        }
    }
}

/// What a line of input asks for
enum Input {
    Command(MarketCommand),
    Locate(Option<Coordinate>),
    Help,
    Quit,
}

fn read_input(line: &str) -> marketplace::MarketResult<Input> {
    let line = line.trim();
    match line {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        _ => {}
    }
    if let Some(rest) = line.strip_prefix("locate") {
        let rest = rest.trim();
        if rest == "off" {
            return Ok(Input::Locate(None));
        }
        return Ok(Input::Locate(Some(rest.parse()?)));
    }
    parse_command(line).map(Input::Command)
}

async fn read_stdin(
    commands: mpsc::Sender<MarketCommand>,
    shutdown: mpsc::Sender<()>,
    location: ManualLocationProvider,
    console: ConsoleNotifier,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                logging::log_error(Component::Presentation, "Reading stdin", &e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match read_input(&line) {
            Ok(Input::Command(command)) => {
                if commands.send(command).await.is_err() {
                    return;
                }
            }
            Ok(Input::Locate(fix)) => {
                location.set_device_location(fix).await;
                let text = match fix {
                    Some(at) => format!("Location set to {at}"),
                    None => "Location cleared".to_string(),
                };
                let _ = console.toast(&text, std::time::Duration::from_secs(3)).await;
            }
            Ok(Input::Help) => println!("{HELP}"),
            Ok(Input::Quit) => break,
            Err(e) => {
                let _ = console.toast(&e.to_string(), std::time::Duration::from_secs(5)).await;
            }
        }
    }
    let _ = shutdown.send(()).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let mut config = MarketConfig::from_env().context("reading MARKET_* environment")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    logging::log_startup("marketplace");
    market_info!(
        Component::Engine,
        "State file {}, radius {} km, scans every {:?}",
        config.state_path.display(),
        config.proximity_radius_km,
        config.scan_interval
    );

    let location = ManualLocationProvider::new();
    location.set_device_location(args.location).await;
    let console = ConsoleNotifier::new(args.platform_notifications);
    let store = JsonFileStore::new(config.state_path.clone());

    let mut market = Marketplace::new(config, store, console.clone(), location.clone(), SystemClock);
    market.initialize().await.context("starting marketplace")?;
    if args.demo {
        let seeded = market.seed_demo().await.context("seeding demo vendors")?;
        if seeded == 0 {
            market_warn!(Component::Catalog, "Catalog already has vendors, demo data not added");
        }
    }

    let shutdown_sender = market.shutdown_sender();
    let ctrl_c_sender = shutdown_sender.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("received Ctrl+C");
                let _ = ctrl_c_sender.send(()).await;
            }
            Err(err) => logging::log_error(Component::Engine, "Signal handling", &err),
        }
    });
    tokio::spawn(read_stdin(market.command_sender(), shutdown_sender, location, console));

    println!("Type 'help' for commands.");
    market.run().await.context("marketplace loop")?;
    logging::log_success(Component::Engine, "Marketplace stopped gracefully");
    Ok(())
}
