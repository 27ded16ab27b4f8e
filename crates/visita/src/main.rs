mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use visita_core::Portal;

use crate::cli::{AvailabilityCommand, Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // The suggestion helper is pure local computation; answer it
    // without requiring a configured backend.
    if let Command::Availability(ref args) = cli.command {
        if let AvailabilityCommand::Suggest { date } = args.command {
            let now = chrono::Local::now().naive_local();
            match visita_core::calendar::suggest_next_window(date, now) {
                Some((start, end)) => {
                    output::print_output(&format!("{start}-{end}"), cli.global.quiet);
                }
                None => {
                    if !cli.global.quiet {
                        eprintln!("No suggestable window remains for {date}.");
                    }
                }
            }
            return Ok(());
        }
    }

    // Everything else needs a portal session.
    let mut portal_config = config::build_portal_config(&cli.global)?;
    // Single request-response cycle: no background polling or sweeping.
    portal_config.visit_poll_interval = Duration::ZERO;
    portal_config.sweep_interval = Duration::ZERO;

    let portal = Portal::new(portal_config);
    portal.connect().await.map_err(CliError::from)?;

    tracing::debug!(command = ?cli.command, "dispatching command");
    let result = commands::dispatch(cli.command, &portal, &cli.global).await;

    portal.disconnect().await;
    result
}
