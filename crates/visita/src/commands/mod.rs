//! Command handlers, one module per command group.

pub mod availability;
pub mod util;
pub mod visits;

use visita_core::Portal;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Command,
    portal: &Portal,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::Availability(args) => availability::handle(portal, args, global).await,
        Command::Visits(args) => visits::handle(portal, args, global).await,
    }
}
