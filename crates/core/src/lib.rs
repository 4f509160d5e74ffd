pub mod config;
pub mod export;
pub mod extract;
pub mod media;
pub mod media_server;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod retry;
pub mod secondary;
pub mod store;
pub mod sync;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ExportFormat, RemoveMode, SanitizedConfig,
};
pub use export::{ExportError, ExportSummary, Exporter};
pub use extract::extract_tmdb_id;
pub use media::{CatalogItem, FileInfo, ItemMetadata, Library, MediaKind, TagField};
pub use media_server::{MediaServer, MediaServerError, PlexClient};
pub use normalize::{normalize, normalize_all, reconcile};
pub use provider::{KeywordProvider, ProviderError, TmdbClient};
pub use resolver::{IdResolver, IdSource, Resolution};
pub use retry::{RetryPolicy, Retryable};
pub use secondary::{
    RadarrClient, SecondaryCatalog, SecondaryCatalogError, SecondaryEntry, SonarrClient,
};
pub use store::{JsonFileStore, MemoryStore, ProcessingRecord, RecordStore, StoreError};
pub use sync::{ItemOutcome, PassSummary, RemovalSummary, SyncEngine, SyncError, SyncSettings};
