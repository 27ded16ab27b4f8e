// ── Core error types ──
//
// User-facing errors from visita-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<visita_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

use crate::model::VisitStatus;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the portal at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication expired: {message}")]
    AuthExpired { message: String },

    #[error("Not signed in with the role required for this action: {action}")]
    Forbidden { action: String },

    #[error("Portal disconnected")]
    PortalDisconnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Validation errors (resolved client-side before any network call) ──
    /// One or more candidate slot times fall inside the 10-minute lead
    /// window. The whole batch is rejected; nothing was published.
    #[error("Slot times violate the 10-minute lead time: {}", .offending.join(", "))]
    LeadTimeViolation { offending: Vec<String> },

    /// A visit must be scheduled strictly in the future.
    #[error("Scheduled time {at} is not in the future")]
    PastScheduleTime { at: chrono::NaiveDateTime },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    /// A transition was attempted from a state that does not allow it.
    #[error("Cannot {action} a visit request that is {from}")]
    InvalidTransition {
        from: VisitStatus,
        action: &'static str,
    },

    /// The backend reports the item changed underneath us; the caller
    /// should re-fetch before acting again.
    #[error("The visit request changed on the backend: {message}")]
    Conflict { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if polling should suspend until re-authentication.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }

    /// Returns `true` if this error is worth retrying on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<visita_api::Error> for CoreError {
    fn from(err: visita_api::Error) -> Self {
        match err {
            visita_api::Error::Authentication { message } => CoreError::AuthExpired { message },
            visita_api::Error::Forbidden { message } => CoreError::Forbidden { action: message },
            visita_api::Error::Validation { message, .. } => {
                CoreError::ValidationFailed { message }
            }
            visita_api::Error::NotFound { message } => CoreError::NotFound {
                entity: "resource",
                identifier: message,
            },
            visita_api::Error::Conflict { message } => CoreError::Conflict { message },
            visita_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            visita_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            visita_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            visita_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            visita_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
