// ── Runtime portal configuration ──
//
// These types describe *how* to talk to the marketplace backend.
// They carry the bearer token and polling tuning, but never touch disk.
// The CLI constructs a `PortalConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Configuration for one portal session.
///
/// Built by the CLI, passed to `Portal` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend base URL (e.g., `https://api.visita.example`).
    pub url: Url,
    /// Bearer token for the signed-in user. `None` only works against
    /// backends that accept anonymous reads.
    pub token: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
    /// How often the visit views are re-fetched. Zero disables polling
    /// (oneshot CLI mode).
    pub visit_poll_interval: Duration,
    /// How often the local expiry sweeper prunes the cached calendar.
    /// Zero disables the sweeper.
    pub sweep_interval: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: "https://api.visita.app"
                .parse()
                .expect("default URL should parse"),
            token: None,
            timeout: Duration::from_secs(30),
            visit_poll_interval: crate::calendar::VISIT_POLL_INTERVAL,
            sweep_interval: crate::calendar::SWEEP_INTERVAL,
        }
    }
}
