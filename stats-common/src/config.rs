//! Configuration loading: database URL and HTTP listen port
//!
//! Database URL resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DATABASE_URL` environment variable
//! 3. TOML config file (`database_url` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Port used when neither `PORT` nor `FLASK_RUN_PORT` is set
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variables consulted for the listen port, in priority order
pub const PORT_ENV_VARS: [&str; 2] = ["PORT", "FLASK_RUN_PORT"];

/// Environment variable holding the database connection URL
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Application directory name under the platform config/data dirs
const APP_DIR: &str = "stats-admin";

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Database connection URL
    pub database_url: Option<String>,
}

/// Resolve the HTTP listen port
///
/// `--port` wins, then `PORT`, then `FLASK_RUN_PORT`, then [`DEFAULT_PORT`].
/// A set but unparseable variable is a configuration error.
pub fn resolve_port(cli_arg: Option<u16>) -> Result<u16> {
    resolve_port_with(cli_arg, |name| std::env::var(name).ok())
}

/// [`resolve_port`] with an injectable environment lookup
pub fn resolve_port_with<F>(cli_arg: Option<u16>, lookup: F) -> Result<u16>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = cli_arg {
        return Ok(port);
    }

    for name in PORT_ENV_VARS {
        if let Some(value) = lookup(name) {
            return value.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("{} must be a port number, got {:?}: {}", name, value, e))
            });
        }
    }

    Ok(DEFAULT_PORT)
}

/// Resolve the database connection URL
pub fn resolve_database_url(cli_arg: Option<&str>) -> String {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        return url.to_string();
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        if !url.trim().is_empty() {
            return url;
        }
    }

    // Priority 3: TOML config file
    if let Some(config) = find_config_file().and_then(|path| load_toml_config(&path)) {
        if let Some(url) = config.database_url {
            return url;
        }
    }

    // Priority 4: OS-dependent compiled default
    default_database_url()
}

/// Load and parse a TOML config file
///
/// Missing or malformed files never abort startup; they are logged and
/// treated as absent.
pub fn load_toml_config(path: &std::path::Path) -> Option<TomlConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str::<TomlConfig>(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring malformed config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Locate the config file for the platform
///
/// Tries `<config_dir>/stats-admin/config.toml`, then (on Linux)
/// `/etc/stats-admin/config.toml`.
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./stats_admin_data"));

    format!("sqlite://{}", dir.join("stats-admin.db").display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_port_defaults_to_5000() {
        assert_eq!(resolve_port_with(None, env_of(&[])).unwrap(), 5000);
    }

    #[test]
    fn test_port_prefers_port_over_flask_run_port() {
        let lookup = env_of(&[("PORT", "8080"), ("FLASK_RUN_PORT", "9090")]);
        assert_eq!(resolve_port_with(None, lookup).unwrap(), 8080);
    }

    #[test]
    fn test_port_falls_back_to_flask_run_port() {
        let lookup = env_of(&[("FLASK_RUN_PORT", "9090")]);
        assert_eq!(resolve_port_with(None, lookup).unwrap(), 9090);
    }

    #[test]
    fn test_cli_port_wins() {
        let lookup = env_of(&[("PORT", "8080")]);
        assert_eq!(resolve_port_with(Some(7000), lookup).unwrap(), 7000);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let lookup = env_of(&[("PORT", "eighty")]);
        let err = resolve_port_with(None, lookup).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_default_database_url_is_sqlite() {
        let url = default_database_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("stats-admin.db"));
    }
}
