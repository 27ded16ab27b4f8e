use thiserror::Error;

/// Top-level error type for the `visita-api` crate.
///
/// Covers every failure mode of the scheduling endpoints: transport,
/// authentication, and the backend's structured error responses.
/// `visita-core` maps these into domain-appropriate variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication / authorization ──────────────────────────────
    /// Token rejected or session expired (HTTP 401).
    #[error("Authentication required: {message}")]
    Authentication { message: String },

    /// The authenticated user lacks the role for this operation (HTTP 403).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // ── Request rejection ───────────────────────────────────────────
    /// The backend rejected the request payload (HTTP 400).
    /// Lead-time and future-time violations surface here when the
    /// client-side pre-check was bypassed or out of date.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        code: Option<String>,
    },

    /// The addressed resource does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The resource changed underneath the request (HTTP 409) --
    /// e.g. a transition attempted from a state the request left.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Other API failures ──────────────────────────────────────────
    /// Any other non-2xx response from the backend.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the bearer token is no
    /// longer accepted and polling should be suspended.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on
    /// the next poll tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the backend reported a state conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
