//! weatherwatch - forecasts for your watched cities
//!
//! A command-line front end that shows a forecast card for every city on a
//! persisted watch list, from the response cache when offline and from the
//! network when available.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weatherwatch::app::App;
use weatherwatch::cli::{resolve_city, Cli, Command};
use weatherwatch::config::Config;
use weatherwatch::data::city::all_cities;
use weatherwatch::refresh::{self, RefreshConfig};
use weatherwatch::store::SqliteStore;
use weatherwatch::ui::TextRenderer;
use weatherwatch::watchlist::{Commit, Origin};

const NOT_SAVED: &str =
    "warning: the watch list could not be saved; this change only lasts for this run";

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.clone().unwrap_or(Command::Show);

    // Needs neither the database nor the network
    if command == Command::Cities {
        for city in all_cities() {
            println!("{:<14} {}", city.key, city.label);
        }
        return Ok(());
    }

    let config = Config::from_cli(&cli)?;
    let store = SqliteStore::open(config.db_path.clone());
    let fetcher = config.snapshot_fetcher()?;
    let mut app = App::new(store, fetcher, TextRenderer::new(io::stdout()));

    match command {
        Command::Show => {
            let loaded = app.start().await;
            report_load(loaded.origin, loaded.cities.is_empty(), app.watch_list().is_durable());
        }
        Command::Watch { interval } => {
            let loaded = app.start().await;
            report_load(loaded.origin, loaded.cities.is_empty(), app.watch_list().is_durable());

            let config = RefreshConfig {
                interval: std::time::Duration::from_secs(interval),
            };
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            refresh::run(&mut app, config, shutdown).await;
        }
        Command::Add { key, label } => {
            let city = resolve_city(&key, label.as_deref())?;
            app.load().await;
            let commit = app.add_city(city.clone()).await?;
            eprintln!("Added {} [{}]", city.label, city.key);
            if commit == Commit::Ephemeral {
                eprintln!("{NOT_SAVED}");
            }
        }
        Command::Remove { key } => {
            app.load().await;
            match app.remove_city(&key).await {
                Commit::Unchanged => eprintln!("{key} is not on the watch list"),
                Commit::Durable => eprintln!("Removed {key}"),
                Commit::Ephemeral => {
                    eprintln!("Removed {key}");
                    eprintln!("{NOT_SAVED}");
                }
            }
        }
        Command::List => {
            app.load().await;
            for city in app.watch_list().cities() {
                println!("{:<14} {}", city.key, city.label);
            }
        }
        Command::Cities => {} // handled above
    }

    Ok(())
}

fn report_load(origin: Origin, empty: bool, durable: bool) {
    match origin {
        Origin::Seeded => {
            eprintln!("Showing a sample forecast. Add cities with `weatherwatch add`.");
            if !durable {
                eprintln!("{NOT_SAVED}");
            }
        }
        Origin::Memory => eprintln!("warning: the watch list is unavailable; changes will not be saved"),
        Origin::Persisted if empty => eprintln!("The watch list is empty. Add cities with `weatherwatch add`."),
        Origin::Persisted => {}
    }
}
