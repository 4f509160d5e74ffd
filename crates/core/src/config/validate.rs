use tracing::warn;

use super::{
    types::{Config, ServiceConfig, DEFAULT_BATCH_DELAY_SECS, DEFAULT_BATCH_SIZE},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Plex url and token are present
/// - TMDb token is present
/// - At least one library selection exists
/// - Enabled Radarr/Sonarr integrations carry both url and api key
/// - Export tags come with an export location
/// - Process interval is not 0
///
/// Non-positive batch parameters are not errors; they are reported and the
/// defaults are used instead.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.plex.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "plex.url is required".to_string(),
        ));
    }
    if config.plex.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "plex.token is required".to_string(),
        ));
    }
    if config.tmdb.read_access_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.read_access_token is required".to_string(),
        ));
    }

    if !config.libraries.movies_selected() && !config.libraries.shows_selected() {
        return Err(ConfigError::ValidationError(
            "no libraries selected: set movie_library_id, movie_process_all, tv_library_id or tv_process_all".to_string(),
        ));
    }

    validate_service("radarr", &config.radarr)?;
    validate_service("sonarr", &config.sonarr)?;

    if !config.export.tags.is_empty() && config.export.location.is_none() {
        return Err(ConfigError::ValidationError(
            "export.location is required when export.tags is set".to_string(),
        ));
    }

    if config.sync.process_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.process_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.sync.batch_size <= 0 {
        warn!(
            "sync.batch_size must be positive (got {}), using default {}",
            config.sync.batch_size, DEFAULT_BATCH_SIZE
        );
    }
    if config.sync.batch_delay_secs <= 0 {
        warn!(
            "sync.batch_delay_secs must be positive (got {}), using default {}",
            config.sync.batch_delay_secs, DEFAULT_BATCH_DELAY_SECS
        );
    }

    Ok(())
}

fn validate_service(name: &str, service: &ServiceConfig) -> Result<(), ConfigError> {
    if !service.enabled {
        return Ok(());
    }

    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !present(&service.url) || !present(&service.api_key) {
        return Err(ConfigError::ValidationError(format!(
            "{name} is enabled but {name}.url and {name}.api_key are both required"
        )));
    }

    Ok(())
}
