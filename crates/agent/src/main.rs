use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labelarr_core::config::{LibrariesConfig, ServiceConfig};
use labelarr_core::{
    load_config, load_config_from_env, validate_config, Config, Exporter, IdResolver,
    JsonFileStore, KeywordProvider, Library, MediaKind, MediaServer, MemoryStore, PlexClient,
    ProviderError, RadarrClient, RecordStore, SanitizedConfig, SecondaryCatalog, SonarrClient,
    SyncEngine, SyncSettings, TmdbClient,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

const VERBOSE_FILTER: &str = "info,labelarr=debug,labelarr_core=debug";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var("LABELARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = match read_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_logging(false);
            return Err(e);
        }
    };
    init_logging(config.sync.verbose);

    info!("labelarr {} starting", VERSION);
    validate_config(&config).context("Configuration validation failed")?;
    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let plex = Arc::new(PlexClient::new(&config.plex).context("Failed to create Plex client")?);
    let media_server: Arc<dyn MediaServer> = plex;

    let tmdb = TmdbClient::new(&config.tmdb).context("Failed to create TMDb client")?;
    verify_tmdb(&tmdb).await?;
    let provider: Arc<dyn KeywordProvider> = Arc::new(tmdb);

    let mut resolver = IdResolver::new(Arc::clone(&media_server));
    if config.radarr.enabled {
        let radarr =
            RadarrClient::new(&config.radarr).context("Failed to create Radarr client")?;
        let catalog = verify_service(Arc::new(radarr), &config.radarr).await?;
        resolver = resolver.with_movie_catalog(catalog);
    }
    if config.sonarr.enabled {
        let sonarr =
            SonarrClient::new(&config.sonarr).context("Failed to create Sonarr client")?;
        let catalog = verify_service(Arc::new(sonarr), &config.sonarr).await?;
        resolver = resolver.with_show_catalog(catalog);
    }

    let store = open_store(&config)?;

    let settings = SyncSettings::from(&config.sync);
    let mut engine = SyncEngine::new(
        Arc::clone(&media_server),
        provider,
        resolver,
        store,
        settings,
    );
    if config.export.enabled() {
        let exporter = Exporter::new(&config.export).context("Failed to set up export")?;
        engine = engine.with_exporter(Arc::new(exporter));
    }

    let libraries = select_libraries(media_server.as_ref(), &config.libraries).await?;

    if let Some(mode) = engine.settings().remove {
        info!("Removal mode: running once");
        engine.run_removal(&libraries, mode).await;
        return Ok(());
    }

    run_loop(&engine, &libraries, &config).await;
    info!("labelarr stopped");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { VERBOSE_FILTER } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// The file when it exists, otherwise the environment alone.
fn read_config(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        load_config_from_env().with_context(|| {
            format!(
                "No config file at {:?} and the environment is incomplete",
                path
            )
        })
    }
}

/// Only a rejected token is fatal; the provider may just be slow right now.
async fn verify_tmdb(tmdb: &TmdbClient) -> Result<()> {
    match tmdb.verify().await {
        Ok(()) => {
            info!("TMDb connection verified");
            Ok(())
        }
        Err(ProviderError::Unauthorized) => bail!("TMDb rejected the read access token"),
        Err(e) => {
            warn!("Could not verify TMDb connection, continuing: {}", e);
            Ok(())
        }
    }
}

/// Connectivity of an enabled secondary catalog is checked once; failure is
/// fatal.
async fn verify_service<C>(
    catalog: Arc<C>,
    config: &ServiceConfig,
) -> Result<Arc<dyn SecondaryCatalog>>
where
    C: SecondaryCatalog + 'static,
{
    let status = catalog.system_status().await.with_context(|| {
        format!(
            "Failed to connect to {} at {}",
            catalog.name(),
            config.url.as_deref().unwrap_or_default()
        )
    })?;
    info!(
        "{} integration enabled ({} {})",
        catalog.name(),
        status.app_name,
        status.version
    );
    Ok(catalog)
}

fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match &config.storage.data_dir {
        Some(dir) => {
            let store = JsonFileStore::open(dir)
                .with_context(|| format!("Failed to open record store in {:?}", dir))?;
            info!("Record store: {:?} ({} records)", store.path(), store.count()?);
            Ok(Arc::new(store))
        }
        None => {
            warn!("No storage.data_dir configured: processing history is kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Resolve the configured selection against the server's sections, movies
/// first.
async fn select_libraries(
    media_server: &dyn MediaServer,
    selection: &LibrariesConfig,
) -> Result<Vec<Library>> {
    let all = media_server
        .libraries()
        .await
        .context("Failed to list Plex libraries")?;

    let mut selected = Vec::new();
    for (kind, process_all, id) in [
        (
            MediaKind::Movie,
            selection.movie_process_all,
            selection.movie_library_id.as_deref(),
        ),
        (
            MediaKind::Show,
            selection.tv_process_all,
            selection.tv_library_id.as_deref(),
        ),
    ] {
        let of_kind = all.iter().filter(|l| l.kind() == Some(kind));
        if process_all {
            selected.extend(of_kind.cloned());
        } else if let Some(id) = id {
            let library = all
                .iter()
                .find(|l| l.key == id)
                .with_context(|| format!("Library {} not found on the Plex server", id))?;
            if library.kind() != Some(kind) {
                bail!(
                    "Library {} ('{}') is a {} library, expected {}",
                    id,
                    library.title,
                    library.section_type,
                    kind
                );
            }
            selected.push(library.clone());
        }
    }

    for library in &selected {
        info!(
            "Selected library '{}' (id {}, {})",
            library.title, library.key, library.section_type
        );
    }
    Ok(selected)
}

/// Run a pass now and then on every tick until Ctrl+C or SIGTERM. A running
/// pass is finished before the signal is acted on.
async fn run_loop(engine: &SyncEngine, libraries: &[Library], config: &Config) {
    let period = config.sync.process_interval();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Processing every {:?}", period);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        // Polling the shutdown future first installs the signal handlers
        // before the first pass starts.
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let summary = engine.run_pass(libraries).await;
                info!(
                    "Next pass in {:?} ({} items seen, {} updated)",
                    period,
                    summary.total,
                    summary.new + summary.updated
                );
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelarr_core::testing::{fixtures, MockMediaServer};

    fn server() -> MockMediaServer {
        let server = MockMediaServer::new();
        tokio_test::block_on(async {
            server.add_library(fixtures::library("1", "Movies", "movie")).await;
            server.add_library(fixtures::library("2", "TV", "show")).await;
            server.add_library(fixtures::library("3", "4K Movies", "movie")).await;
            server.add_library(fixtures::library("4", "Music", "artist")).await;
        });
        server
    }

    fn keys(libraries: &[Library]) -> Vec<&str> {
        libraries.iter().map(|l| l.key.as_str()).collect()
    }

    #[test]
    fn test_select_by_id_movies_first() {
        let selection = LibrariesConfig {
            movie_library_id: Some("3".into()),
            tv_library_id: Some("2".into()),
            ..Default::default()
        };
        let selected = tokio_test::block_on(select_libraries(&server(), &selection)).unwrap();
        assert_eq!(keys(&selected), vec!["3", "2"]);
    }

    #[test]
    fn test_select_all_of_a_kind() {
        let selection = LibrariesConfig {
            movie_process_all: true,
            ..Default::default()
        };
        let selected = tokio_test::block_on(select_libraries(&server(), &selection)).unwrap();
        assert_eq!(keys(&selected), vec!["1", "3"]);
    }

    #[test]
    fn test_unknown_library_id_is_fatal() {
        let selection = LibrariesConfig {
            tv_library_id: Some("99".into()),
            ..Default::default()
        };
        let err = tokio_test::block_on(select_libraries(&server(), &selection)).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_library_of_wrong_kind_is_fatal() {
        let selection = LibrariesConfig {
            movie_library_id: Some("2".into()),
            ..Default::default()
        };
        assert!(tokio_test::block_on(select_libraries(&server(), &selection)).is_err());
    }
}
