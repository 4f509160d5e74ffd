//! Plex Media Server HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{MediaServer, MediaServerError};
use crate::config::PlexConfig;
use crate::media::{CatalogItem, ExternalId, FileInfo, ItemMetadata, Library, MediaKind, TagField};
use crate::retry::RetryPolicy;

const TOKEN_HEADER: &str = "X-Plex-Token";

/// Plex API client.
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl PlexClient {
    /// Create a new Plex client.
    pub fn new(config: &PlexConfig) -> Result<Self, MediaServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, MediaServerError> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        let label = format!("Plex GET {}", path);

        self.retry
            .run(&label, move || async move {
                let response = self.request(Method::GET, url, query).send().await?;
                let response = self.check_status(response, path).await?;
                response.json::<T>().await.map_err(|e| {
                    MediaServerError::ParseError(format!("{}: {}", path, e))
                })
            })
            .await
    }

    async fn put(&self, path: &str, query: &[(String, String)]) -> Result<(), MediaServerError> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        let label = format!("Plex PUT {}", path);

        self.retry
            .run(&label, move || async move {
                let response = self.request(Method::PUT, url, query).send().await?;
                self.check_status(response, path).await?;
                Ok::<(), MediaServerError>(())
            })
            .await
    }

    fn request(&self, method: Method, url: &str, query: &[(String, String)]) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(TOKEN_HEADER, &self.token)
            .header(ACCEPT, "application/json")
            .query(query)
    }

    async fn check_status(
        &self,
        response: Response,
        context: &str,
    ) -> Result<Response, MediaServerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == 401 {
            return Err(MediaServerError::Unauthorized);
        }
        if status == 404 {
            return Err(MediaServerError::NotFound(context.to_string()));
        }

        let message = response.text().await.unwrap_or_default();
        if self.retry.is_retryable_status(status.as_u16()) {
            Err(MediaServerError::Transient {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(MediaServerError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Plex metadata type codes used by the library edit endpoint.
fn plex_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "1",
        MediaKind::Show => "2",
    }
}

fn edit_target(item: &CatalogItem) -> Vec<(String, String)> {
    vec![
        ("type".to_string(), plex_type(item.kind()).to_string()),
        ("id".to_string(), item.key().to_string()),
        ("includeExternalMedia".to_string(), "1".to_string()),
    ]
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn libraries(&self) -> Result<Vec<Library>, MediaServerError> {
        debug!("Plex list libraries");

        let response: MediaContainerResponse<SectionsContainer> =
            self.get_json("/library/sections", &[]).await?;

        Ok(response
            .media_container
            .directories
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn library_items(
        &self,
        library_key: &str,
        kind: MediaKind,
    ) -> Result<Vec<CatalogItem>, MediaServerError> {
        debug!("Plex list items: library={}", library_key);

        let path = format!("/library/sections/{}/all", urlencoding::encode(library_key));
        let query = [("includeGuids".to_string(), "1".to_string())];
        let response: MediaContainerResponse<MetadataContainer> =
            self.get_json(&path, &query).await?;

        Ok(response
            .media_container
            .metadata
            .into_iter()
            .map(|m| CatalogItem::new(kind, m.into()))
            .collect())
    }

    async fn item_details(
        &self,
        item_key: &str,
        kind: MediaKind,
    ) -> Result<CatalogItem, MediaServerError> {
        debug!("Plex item details: key={}", item_key);

        let path = format!("/library/metadata/{}", urlencoding::encode(item_key));
        let response: MediaContainerResponse<MetadataContainer> =
            self.get_json(&path, &[]).await?;

        response
            .media_container
            .metadata
            .into_iter()
            .next()
            .map(|m| CatalogItem::new(kind, m.into()))
            .ok_or_else(|| MediaServerError::NotFound(format!("item {}", item_key)))
    }

    async fn episode_files(
        &self,
        show_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FileInfo>, MediaServerError> {
        debug!("Plex episode files: key={}, limit={:?}", show_key, limit);

        let path = format!("/library/metadata/{}/allLeaves", urlencoding::encode(show_key));
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("X-Plex-Container-Start".to_string(), "0".to_string()));
            query.push(("X-Plex-Container-Size".to_string(), limit.to_string()));
        }

        let response: MediaContainerResponse<MetadataContainer> =
            self.get_json(&path, &query).await?;

        Ok(response
            .media_container
            .metadata
            .into_iter()
            .flat_map(|episode| episode.files())
            .collect())
    }

    async fn update_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
    ) -> Result<(), MediaServerError> {
        debug!(
            "Plex update {}: key={}, values={}",
            field,
            item.key(),
            tags.len()
        );

        let path = format!("/library/sections/{}/all", urlencoding::encode(library_key));
        let mut query = edit_target(item);
        for (i, tag) in tags.iter().enumerate() {
            query.push((format!("{}[{}].tag.tag", field, i), tag.clone()));
        }
        query.push((format!("{}.locked", field), "1".to_string()));

        self.put(&path, &query).await
    }

    async fn remove_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
        lock: bool,
    ) -> Result<(), MediaServerError> {
        debug!(
            "Plex remove {}: key={}, values={}, lock={}",
            field,
            item.key(),
            tags.len(),
            lock
        );

        let path = format!("/library/sections/{}/all", urlencoding::encode(library_key));
        let mut query = edit_target(item);
        query.push((format!("{}[].tag.tag-", field), tags.join(",")));
        query.push((
            format!("{}.locked", field),
            if lock { "1" } else { "0" }.to_string(),
        ));

        self.put(&path, &query).await
    }
}

// ============================================================================
// Plex API response types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MediaContainerResponse<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
struct PlexDirectory {
    key: String,
    #[serde(rename = "type")]
    section_type: String,
    title: String,
}

impl From<PlexDirectory> for Library {
    fn from(d: PlexDirectory) -> Self {
        Library {
            key: d.key,
            title: d.title,
            section_type: d.section_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: Option<i32>,
    /// Primary agent guid ("plex://movie/..." or a legacy agent guid).
    #[serde(default)]
    guid: Option<String>,
    #[serde(rename = "Guid", default)]
    guids: Option<PlexGuids>,
    #[serde(rename = "Label", default)]
    labels: Vec<PlexTag>,
    #[serde(rename = "Genre", default)]
    genres: Vec<PlexTag>,
    #[serde(rename = "Media", default)]
    media: Vec<PlexMedia>,
}

impl PlexMetadata {
    fn files(&self) -> Vec<FileInfo> {
        self.media
            .iter()
            .flat_map(|m| &m.parts)
            .filter_map(|p| p.file.as_ref().map(|f| FileInfo::new(f.clone(), p.size)))
            .collect()
    }
}

impl From<PlexMetadata> for ItemMetadata {
    fn from(m: PlexMetadata) -> Self {
        let files = m.files();

        let mut raw_guids: Vec<String> = m.guids.map(PlexGuids::into_ids).unwrap_or_default();
        if let Some(primary) = m.guid {
            raw_guids.push(primary);
        }
        let external_ids = raw_guids.iter().filter_map(|g| ExternalId::parse(g)).collect();

        ItemMetadata {
            key: m.rating_key,
            title: m.title,
            year: m.year,
            external_ids,
            files,
            labels: m.labels.into_iter().map(|t| t.tag).collect(),
            genres: m.genres.into_iter().map(|t| t.tag).collect(),
        }
    }
}

/// Plex serializes `Guid` as a list of objects, a single object, or a bare
/// string depending on server version and endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlexGuids {
    Many(Vec<PlexGuid>),
    One(PlexGuid),
    Plain(String),
}

impl PlexGuids {
    fn into_ids(self) -> Vec<String> {
        match self {
            PlexGuids::Many(guids) => guids.into_iter().map(|g| g.id).collect(),
            PlexGuids::One(guid) => vec![guid.id],
            PlexGuids::Plain(id) => vec![id],
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlexTag {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct PlexMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<PlexPart>,
}

#[derive(Debug, Deserialize)]
struct PlexPart {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    size: u64,
}
