//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use visita_core::CoreError;

/// Process exit codes, stable for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the portal at {url}")]
    #[diagnostic(
        code(visita::connection_failed),
        help(
            "Check that the backend is reachable.\n\
             URL: {url}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(code(visita::timeout))]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication expired or missing")]
    #[diagnostic(
        code(visita::auth_expired),
        help(
            "Sign in again and update the token.\n\
             Set VISITA_TOKEN, or point token_env at the right variable\n\
             in your profile."
        )
    )]
    AuthExpired { message: String },

    #[error("Not permitted: {action}")]
    #[diagnostic(
        code(visita::forbidden),
        help("This action belongs to the other side of the request (requester vs. recipient).")
    )]
    Forbidden { action: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(visita::validation),
        help("Fix the flagged values and submit again; nothing was changed.")
    )]
    Validation { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(visita::conflict),
        help(
            "The request changed on the backend since your last look.\n\
             Run: visita visits mine (or: visita visits assigned) and retry."
        )
    )]
    Conflict { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(visita::not_found),
        help("Run: visita {list_command} to see what's there")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend error: {message}")]
    #[diagnostic(code(visita::api_error))]
    ApiError {
        message: String,
        code: Option<String>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(visita::config),
        help("Check the profile in your visita.toml or the VISITA_* environment overrides.")
    )]
    Config { message: String },

    // ── Catch-all ────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(visita::general))]
    General(String),
}

impl CliError {
    /// Map to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthExpired { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ApiError { .. } | Self::Config { .. } | Self::General(_) => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { .. } => Self::Timeout,
            CoreError::AuthExpired { message } => Self::AuthExpired { message },
            CoreError::Forbidden { action } => Self::Forbidden { action },
            CoreError::PortalDisconnected => Self::General("portal disconnected".into()),
            err @ (CoreError::LeadTimeViolation { .. }
            | CoreError::PastScheduleTime { .. }
            | CoreError::InvalidTransition { .. }) => Self::Validation {
                message: err.to_string(),
            },
            CoreError::ValidationFailed { message } => Self::Validation { message },
            CoreError::Conflict { message } => Self::Conflict { message },
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                resource_type: entity.to_owned(),
                identifier,
                list_command: if entity.contains("assigned") {
                    "visits assigned".into()
                } else {
                    "visits mine".into()
                },
            },
            CoreError::Api { message, code, .. } => Self::ApiError { message, code },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::General(message),
        }
    }
}
