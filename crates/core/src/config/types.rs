use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::media::TagField;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_DELAY_SECS: u64 = 10;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub plex: PlexConfig,
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub libraries: LibrariesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub radarr: ServiceConfig,
    #[serde(default)]
    pub sonarr: ServiceConfig,
}

/// Plex media server connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlexConfig {
    /// Base URL, e.g. "http://localhost:32400"
    pub url: String,
    pub token: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// TMDb API access
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// v4 read access token, sent as a bearer credential.
    pub read_access_token: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Which Plex libraries to synchronize
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibrariesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_library_id: Option<String>,
    #[serde(default)]
    pub movie_process_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_library_id: Option<String>,
    #[serde(default)]
    pub tv_process_all: bool,
}

impl LibrariesConfig {
    pub fn movies_selected(&self) -> bool {
        self.movie_process_all || self.movie_library_id.is_some()
    }

    pub fn shows_selected(&self) -> bool {
        self.tv_process_all || self.tv_library_id.is_some()
    }
}

/// Lock state applied to the field after a removal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveMode {
    Lock,
    Unlock,
}

impl RemoveMode {
    pub fn locks(&self) -> bool {
        matches!(self, RemoveMode::Lock)
    }
}

/// Synchronization behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub tag_field: TagField,
    /// Reprocess items even when a matching record exists.
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_process_interval")]
    pub process_interval_secs: u64,
    /// Non-positive values fall back to the default.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Non-positive values fall back to the default.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_secs: i64,
    /// Pause after each successful catalog update.
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,
    /// When set, run a one-shot keyword removal instead of the sync loop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<RemoveMode>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tag_field: TagField::default(),
            force_update: false,
            verbose: false,
            process_interval_secs: default_process_interval(),
            batch_size: default_batch_size(),
            batch_delay_secs: default_batch_delay(),
            item_delay_ms: default_item_delay(),
            remove: None,
        }
    }
}

impl SyncConfig {
    /// Batch size with the non-positive fallback applied.
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size > 0 {
            self.batch_size as usize
        } else {
            DEFAULT_BATCH_SIZE
        }
    }

    /// Inter-batch delay with the non-positive fallback applied.
    pub fn effective_batch_delay(&self) -> Duration {
        if self.batch_delay_secs > 0 {
            Duration::from_secs(self.batch_delay_secs as u64)
        } else {
            Duration::from_secs(DEFAULT_BATCH_DELAY_SECS)
        }
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_process_interval() -> u64 {
    3600
}

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE as i64
}

fn default_batch_delay() -> i64 {
    DEFAULT_BATCH_DELAY_SECS as i64
}

fn default_item_delay() -> u64 {
    500
}

/// Processing record persistence
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding processed_items.json. When absent, records live in
    /// memory for the lifetime of the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Export output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// One path list per (library, tag) plus summary.txt
    #[default]
    Txt,
    /// A single export.json document
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
        }
    }
}

/// File list export for items carrying selected tags
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    #[serde(default)]
    pub format: ExportFormat,
}

impl ExportConfig {
    pub fn enabled(&self) -> bool {
        !self.tags.is_empty() && self.location.is_some()
    }
}

/// Radarr / Sonarr integration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub plex: SanitizedPlexConfig,
    pub tmdb_token_configured: bool,
    pub libraries: LibrariesConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
    pub radarr: SanitizedServiceConfig,
    pub sonarr: SanitizedServiceConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlexConfig {
    pub url: String,
    pub token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServiceConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub api_key_configured: bool,
}

impl From<&ServiceConfig> for SanitizedServiceConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            enabled: config.enabled,
            url: config.url.clone(),
            api_key_configured: config.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            plex: SanitizedPlexConfig {
                url: config.plex.url.clone(),
                token_configured: !config.plex.token.is_empty(),
            },
            tmdb_token_configured: !config.tmdb.read_access_token.is_empty(),
            libraries: config.libraries.clone(),
            sync: config.sync.clone(),
            storage: config.storage.clone(),
            export: config.export.clone(),
            radarr: (&config.radarr).into(),
            sonarr: (&config.sonarr).into(),
        }
    }
}
