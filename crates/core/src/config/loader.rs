use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix; `__` separates nested keys
/// (`LABELARR_PLEX__TOKEN` sets `plex.token`).
const ENV_PREFIX: &str = "LABELARR_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportFormat, RemoveMode};
    use crate::media::TagField;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[plex]
url = "http://localhost:32400"
token = "plex-token"

[tmdb]
read_access_token = "tmdb-token"

[libraries]
movie_process_all = true
"#;

    #[test]
    fn test_load_config_from_str_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.plex.timeout_secs, 30);
        assert_eq!(config.sync.tag_field, TagField::Label);
        assert_eq!(config.sync.batch_size, 100);
        assert_eq!(config.sync.batch_delay_secs, 10);
        assert_eq!(config.sync.item_delay_ms, 500);
        assert_eq!(config.sync.process_interval_secs, 3600);
        assert!(config.sync.remove.is_none());
        assert!(!config.export.enabled());
        assert!(!config.radarr.enabled);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_load_config_from_str_full() {
        let toml = r#"
[plex]
url = "https://plex.example:32400"
token = "t"

[tmdb]
read_access_token = "r"

[libraries]
movie_library_id = "1"
tv_process_all = true

[sync]
tag_field = "genre"
force_update = true
batch_size = 25
batch_delay_secs = 3
remove = "unlock"

[storage]
data_dir = "/data"

[export]
tags = ["4K", "Kids"]
location = "/exports"
format = "json"

[radarr]
enabled = true
url = "http://radarr:7878"
api_key = "k"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.libraries.movie_library_id.as_deref(), Some("1"));
        assert!(config.libraries.tv_process_all);
        assert_eq!(config.sync.tag_field, TagField::Genre);
        assert!(config.sync.force_update);
        assert_eq!(config.sync.remove, Some(RemoveMode::Unlock));
        assert_eq!(config.export.format, ExportFormat::Json);
        assert!(config.export.enabled());
        assert!(config.radarr.enabled);
        assert!(!config.sonarr.enabled);
    }

    #[test]
    fn test_load_config_rejects_unknown_tag_field() {
        let toml = format!("{}\n[sync]\ntag_field = \"collection\"\n", MINIMAL);
        let result = load_config_from_str(&toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_rejects_unknown_export_format() {
        let toml = format!("{}\n[export]\nformat = \"csv\"\n", MINIMAL);
        let result = load_config_from_str(&toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_missing_plex() {
        let toml = r#"
[tmdb]
read_access_token = "r"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", MINIMAL).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.plex.url, "http://localhost:32400");
        assert!(config.libraries.movie_process_all);
    }
}
