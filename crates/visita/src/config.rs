//! CLI-owned configuration: TOML profiles, token resolution, and
//! translation to `visita_core::PortalConfig`.
//!
//! Core never sees these types -- it receives a pre-built `PortalConfig`.

use std::collections::HashMap;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use visita_core::PortalConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config structs ──────────────────────────────────────────────

/// CLI-owned TOML configuration. Core never touches this type.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name (used when --profile is not specified).
    pub default_profile: Option<String>,

    /// Named portal profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// CLI-owned profile definition.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://api.visita.example").
    pub portal: Option<String>,

    /// Bearer token (plaintext -- prefer token_env).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Loading ──────────────────────────────────────────────────────────

/// Path of the user config file, if a home directory exists.
pub fn config_path() -> Option<std::path::PathBuf> {
    ProjectDirs::from("app", "visita", "visita").map(|dirs| dirs.config_dir().join("visita.toml"))
}

/// Load the TOML config merged with `VISITA_` environment overrides.
/// A missing file just yields the defaults.
pub fn load_config_or_default() -> Config {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = config_path() {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed("VISITA_CONFIG_"))
        .extract()
        .unwrap_or_default()
}

/// Which profile name is active for this invocation.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `PortalConfig` from the config file, profile, and CLI overrides.
pub fn build_portal_config(global: &GlobalOpts) -> Result<PortalConfig, CliError> {
    let config = load_config_or_default();
    resolve_portal_config(global, &config)
}

/// Pure resolution step: merge a loaded [`Config`] with CLI overrides.
fn resolve_portal_config(global: &GlobalOpts, config: &Config) -> Result<PortalConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = config.profiles.get(&profile_name);

    let url_str = global
        .portal
        .clone()
        .or_else(|| profile.and_then(|p| p.portal.clone()))
        .ok_or_else(|| CliError::Config {
            message: format!(
                "no portal URL: pass --portal or set one in profile '{profile_name}'"
            ),
        })?;
    let url = url_str.parse().map_err(|e| CliError::Config {
        message: format!("invalid portal URL {url_str:?}: {e}"),
    })?;

    let token = resolve_token(global, profile);
    let timeout = profile
        .and_then(|p| p.timeout)
        .unwrap_or(global.timeout);

    Ok(PortalConfig {
        url,
        token,
        timeout: Duration::from_secs(timeout),
        ..PortalConfig::default()
    })
}

/// Token precedence: CLI flag / VISITA_TOKEN, then the profile's
/// token_env variable, then a plaintext profile token.
fn resolve_token(global: &GlobalOpts, profile: Option<&Profile>) -> Option<SecretString> {
    if let Some(token) = &global.token {
        return Some(SecretString::from(token.clone()));
    }
    if let Some(var) = profile.and_then(|p| p.token_env.as_deref()) {
        if let Ok(token) = std::env::var(var) {
            return Some(SecretString::from(token));
        }
    }
    profile
        .and_then(|p| p.token.clone())
        .map(SecretString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn global_opts() -> GlobalOpts {
        use clap::Parser;
        // Parse an empty command line to get defaults.
        crate::cli::Cli::try_parse_from(["visita", "visits", "mine"])
            .unwrap()
            .global
    }

    #[test]
    fn missing_portal_url_is_a_config_error() {
        let mut global = global_opts();
        global.profile = None;
        global.portal = None;
        // Empty config, no --portal: must fail with a config error.
        let err = resolve_portal_config(&global, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn profile_portal_url_is_used() {
        let mut global = global_opts();
        global.profile = None;
        global.portal = None;
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                portal: Some("https://api.visita.example".into()),
                ..Profile::default()
            },
        );
        let portal_config = resolve_portal_config(&global, &config).unwrap();
        assert_eq!(portal_config.url.as_str(), "https://api.visita.example/");
    }

    #[test]
    fn cli_token_takes_precedence_over_profile() {
        let mut global = global_opts();
        global.token = Some("from-flag".into());
        let profile = Profile {
            token: Some("from-profile".into()),
            ..Profile::default()
        };
        let token = resolve_token(&global, Some(&profile)).unwrap();
        use secrecy::ExposeSecret;
        assert_eq!(token.expose_secret(), "from-flag");
    }
}
