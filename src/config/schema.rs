use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::query::QuerySettings;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tunetap/config.toml` or `~/.config/tunetap/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TUNETAP__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub query: QueryConfig,
    pub cover: CoverSettings,
    pub outputs: Vec<OutputSettings>,
    pub sources: SourcesSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Polling interval (milliseconds).
    pub refresh_rate_ms: u64,
    /// Whether cover art is materialized every cycle.
    pub download_cover: bool,
    /// Identifier of the source polled at startup.
    pub selected_source: String,
    /// Start polling as soon as the program starts.
    pub autostart: bool,
    /// Text written to non-log outputs when nothing is playing.
    pub placeholder: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 500,
            download_cover: false,
            selected_source: "mpris".to_string(),
            autostart: true,
            placeholder: "Nothing playing".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            refresh_rate: Duration::from_millis(self.refresh_rate_ms),
            download_cover: self.download_cover,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoverSettings {
    /// Where the current cover image is written.
    pub path: Option<PathBuf>,
    /// Image copied into `path` when there is no cover.
    pub placeholder: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Template, e.g. `"{artists} - {title}"`.
    pub format: String,
    pub path: PathBuf,
    /// Append a line per new track instead of overwriting.
    pub log_mode: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "{artists} - {title}".to_string(),
            path: PathBuf::from("now_playing.txt"),
            log_mode: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesSettings {
    pub mpris: MprisSettings,
    pub folder: FolderSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MprisSettings {
    /// Scene used when no scene file is set (or it is unreadable).
    pub scene: String,
    /// File whose first line names the current scene.
    pub scene_file: Option<PathBuf>,
    /// Scene name -> ordered player names (`vlc`, `spotify`, full bus names...).
    pub mappings: HashMap<String, Vec<String>>,
    /// Upper bound for every D-Bus call (milliseconds).
    pub call_timeout_ms: u64,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self {
            scene: "default".to_string(),
            scene_file: None,
            mappings: HashMap::new(),
            call_timeout_ms: 1000,
        }
    }
}

impl MprisSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FolderSettings {
    /// Directory watched for the newest audio file. Unset disables the source.
    pub path: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for FolderSettings {
    fn default() -> Self {
        Self {
            path: None,
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "opus".into(),
                "m4a".into(),
            ],
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
    /// Directory for `tunetap.log`. Defaults to the XDG state directory.
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "tunetap=info".to_string(),
            dir: None,
        }
    }
}
