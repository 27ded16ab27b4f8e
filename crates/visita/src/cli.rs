//! Clap derive structures for the `visita` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};

use visita_core::StatusFilter;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// visita -- property-visit scheduling for the Visita marketplace
#[derive(Debug, Parser)]
#[command(
    name = "visita",
    version,
    about = "Schedule and manage property visits from the command line",
    long_about = "Client for the Visita marketplace's visit-scheduling backend.\n\n\
        Agents publish availability slots for their listings; buyers request\n\
        visits and both sides drive the approval and outcome lifecycle.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Portal profile to use
    #[arg(long, short = 'p', env = "VISITA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, env = "VISITA_PORTAL", global = true)]
    pub portal: Option<String>,

    /// Bearer token (prefer token_env in the config file)
    #[arg(long, env = "VISITA_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VISITA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VISITA_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and publish a property's availability calendar
    #[command(alias = "avail", alias = "a")]
    Availability(AvailabilityArgs),

    /// Create and manage visit requests
    #[command(alias = "v")]
    Visits(VisitsArgs),
}

// ── Availability ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AvailabilityArgs {
    #[command(subcommand)]
    pub command: AvailabilityCommand,
}

#[derive(Debug, Subcommand)]
pub enum AvailabilityCommand {
    /// Show the pruned, future-only calendar for a property
    Show {
        /// Property id
        property: String,
    },

    /// Publish visit slots for one date (batch, all-or-nothing)
    Publish {
        /// Property id
        property: String,

        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Comma-separated HH:MM start times (e.g. 10:00,10:30)
        #[arg(long, value_delimiter = ',', required = true)]
        times: Vec<String>,
    },

    /// Delete one published slot (idempotent)
    DeleteSlot {
        /// Slot id
        slot: String,
    },

    /// Suggest the next publishable half-hour window for a date
    Suggest {
        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
}

// ── Visits ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VisitsArgs {
    #[command(subcommand)]
    pub command: VisitsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VisitsCommand {
    /// List visit requests I created
    Mine {
        /// Filter by exact status (all, pending, approved, rejected,
        /// visited, "not visited")
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },

    /// List visit requests assigned to me (agent/admin view)
    Assigned {
        /// Filter by exact status (all, pending, approved, rejected,
        /// visited, "not visited")
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },

    /// Request a visit to a property
    Create {
        /// Property id
        property: String,

        /// Visit date-time (YYYY-MM-DDTHH:MM:SS), strictly in the future
        #[arg(long)]
        at: NaiveDateTime,

        /// Optional note for the agent
        #[arg(long)]
        note: Option<String>,
    },

    /// Move a pending request of mine to a new time
    Reschedule {
        /// Visit request id
        id: String,

        /// New date-time (YYYY-MM-DDTHH:MM:SS), strictly in the future
        #[arg(long)]
        at: NaiveDateTime,

        /// Replace the note as well
        #[arg(long)]
        note: Option<String>,
    },

    /// Move an approved visit as its recipient (status is preserved)
    RecipientReschedule {
        /// Visit request id
        id: String,

        /// New date-time (YYYY-MM-DDTHH:MM:SS), strictly in the future
        #[arg(long)]
        at: NaiveDateTime,
    },

    /// Cancel (remove) a request of mine that is not terminal
    Cancel {
        /// Visit request id
        id: String,
    },

    /// Approve a pending request assigned to me
    Approve {
        /// Visit request id
        id: String,
    },

    /// Reject a pending request assigned to me
    Reject {
        /// Visit request id
        id: String,
    },

    /// Record the outcome of an approved visit
    Outcome {
        /// Visit request id
        id: String,

        /// What actually happened
        #[arg(value_enum)]
        outcome: OutcomeArg,
    },
}

/// CLI spelling of the two outcome values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Visited,
    #[value(name = "not-visited")]
    NotVisited,
}

impl From<OutcomeArg> for visita_core::VisitOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Visited => Self::Visited,
            OutcomeArg::NotVisited => Self::NotVisited,
        }
    }
}
