use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then lets environment
/// variables (prefix `TUNETAP__`) override it, and falls back to struct
/// defaults for anything left unset.
impl Settings {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("TUNETAP")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject settings the query thread cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.refresh_rate_ms == 0 {
            return Err("query.refresh_rate_ms must be >= 1".to_string());
        }
        if self.sources.mpris.call_timeout_ms == 0 {
            return Err("sources.mpris.call_timeout_ms must be >= 1".to_string());
        }
        if let Some(i) = self.outputs.iter().position(|o| o.format.trim().is_empty()) {
            return Err(format!("outputs[{i}].format must not be empty"));
        }
        Ok(())
    }
}

/// Resolve the config path from `TUNETAP_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TUNETAP_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/tunetap/config.toml`, or `~/.config/tunetap/config.toml`
/// when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("tunetap").join("config.toml"))
}

/// `$XDG_STATE_HOME/tunetap`, or `~/.local/state/tunetap`.
pub fn default_state_dir() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("tunetap"))
}
