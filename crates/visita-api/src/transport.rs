// Shared transport configuration for building reqwest::Client instances.
//
// The scheduling client authenticates with a bearer token injected as a
// default header, so one client instance serves every endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub timeout: Option<Duration>,
    pub bearer_token: Option<SecretString>,
}

impl TransportConfig {
    /// Config with a bearer token and the default timeout.
    pub fn with_token(token: SecretString) -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            bearer_token: Some(token),
        }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The bearer token (when present) is injected as a sensitive
    /// `Authorization` default header on every request.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder().user_agent("visita/0.1.0");

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref token) = self.bearer_token {
            let mut headers = HeaderMap::new();
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| crate::error::Error::Authentication {
                    message: format!("invalid bearer token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        builder.build().map_err(crate::error::Error::Transport)
    }
}
