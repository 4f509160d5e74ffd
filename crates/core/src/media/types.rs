use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of catalog entries the agent synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }

    /// Parse a Plex section type ("movie", "show"). Other section types are
    /// not synchronized.
    pub fn from_section_type(section_type: &str) -> Option<Self> {
        match section_type {
            "movie" => Some(MediaKind::Movie),
            "show" => Some(MediaKind::Show),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which catalog attribute is kept in sync with provider keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    #[default]
    Label,
    Genre,
}

impl TagField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagField::Label => "label",
            TagField::Genre => "genre",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-tagged cross-reference attached to an item by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalId {
    /// Canonical provider name: "tmdb", "imdb", "tvdb", or the raw scheme.
    pub provider: String,
    pub id: String,
}

impl ExternalId {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }

    /// Parse a catalog guid such as `tmdb://603`, `imdb://tt0133093` or the
    /// legacy agent form `com.plexapp.agents.themoviedb://603?lang=en`.
    pub fn parse(guid: &str) -> Option<Self> {
        let (scheme, rest) = guid.trim().split_once("://")?;
        let rest = rest.split('?').next().unwrap_or_default();

        let provider = match scheme.rsplit('.').next().unwrap_or(scheme) {
            "tmdb" | "themoviedb" => "tmdb",
            "imdb" => "imdb",
            "tvdb" | "thetvdb" => "tvdb",
            _ => scheme,
        };

        let id = match provider {
            // Legacy episode guids append "/season/episode"
            "tmdb" | "imdb" | "tvdb" => rest.split('/').next().unwrap_or_default(),
            _ => rest,
        };

        if id.is_empty() {
            return None;
        }

        Some(Self::new(provider, id))
    }
}

/// A media file location with its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Metadata shared by both item variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Stable catalog identifier (Plex rating key).
    pub key: String,
    pub title: String,
    pub year: Option<i32>,
    pub external_ids: Vec<ExternalId>,
    pub files: Vec<FileInfo>,
    pub labels: Vec<String>,
    pub genres: Vec<String>,
}

/// A catalog entry read from the media server during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogItem {
    Movie(ItemMetadata),
    Show(ItemMetadata),
}

impl CatalogItem {
    pub fn new(kind: MediaKind, metadata: ItemMetadata) -> Self {
        match kind {
            MediaKind::Movie => CatalogItem::Movie(metadata),
            MediaKind::Show => CatalogItem::Show(metadata),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            CatalogItem::Movie(_) => MediaKind::Movie,
            CatalogItem::Show(_) => MediaKind::Show,
        }
    }

    pub fn metadata(&self) -> &ItemMetadata {
        match self {
            CatalogItem::Movie(m) | CatalogItem::Show(m) => m,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ItemMetadata {
        match self {
            CatalogItem::Movie(m) | CatalogItem::Show(m) => m,
        }
    }

    pub fn key(&self) -> &str {
        &self.metadata().key
    }

    pub fn title(&self) -> &str {
        &self.metadata().title
    }

    pub fn year(&self) -> Option<i32> {
        self.metadata().year
    }

    /// Files attached directly to the item. Series usually have none; their
    /// files live on episodes.
    pub fn files(&self) -> &[FileInfo] {
        &self.metadata().files
    }

    /// Current values of the synchronized field.
    pub fn tags(&self, field: TagField) -> &[String] {
        match field {
            TagField::Label => &self.metadata().labels,
            TagField::Genre => &self.metadata().genres,
        }
    }

    pub fn set_tags(&mut self, field: TagField, tags: Vec<String>) {
        let meta = self.metadata_mut();
        match field {
            TagField::Label => meta.labels = tags,
            TagField::Genre => meta.genres = tags,
        }
    }

    /// First cross-reference for the given provider, if any.
    pub fn external_id(&self, provider: &str) -> Option<&str> {
        self.metadata()
            .external_ids
            .iter()
            .find(|e| e.provider == provider)
            .map(|e| e.id.as_str())
    }
}

/// A library section exposed by the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub key: String,
    pub title: String,
    /// Raw section type as reported by the server.
    pub section_type: String,
}

impl Library {
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_section_type(&self.section_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modern_guid() {
        let id = ExternalId::parse("tmdb://603").unwrap();
        assert_eq!(id, ExternalId::new("tmdb", "603"));
    }

    #[test]
    fn test_parse_guid_strips_query() {
        let id = ExternalId::parse("com.plexapp.agents.themoviedb://603?lang=en").unwrap();
        assert_eq!(id, ExternalId::new("tmdb", "603"));
    }

    #[test]
    fn test_parse_legacy_episode_guid() {
        let id = ExternalId::parse("com.plexapp.agents.thetvdb://121361/1/1?lang=en").unwrap();
        assert_eq!(id, ExternalId::new("tvdb", "121361"));
    }

    #[test]
    fn test_parse_imdb_guid() {
        let id = ExternalId::parse("imdb://tt0133093").unwrap();
        assert_eq!(id.provider, "imdb");
        assert_eq!(id.id, "tt0133093");
    }

    #[test]
    fn test_parse_unknown_scheme_keeps_path() {
        let id = ExternalId::parse("plex://movie/5d776825880197001ec967c7").unwrap();
        assert_eq!(id.provider, "plex");
        assert_eq!(id.id, "movie/5d776825880197001ec967c7");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ExternalId::parse("not a guid").is_none());
        assert!(ExternalId::parse("tmdb://").is_none());
    }

    #[test]
    fn test_tags_follow_field() {
        let item = CatalogItem::new(
            MediaKind::Movie,
            ItemMetadata {
                key: "1".into(),
                labels: vec!["Heist".into()],
                genres: vec!["Crime".into()],
                ..Default::default()
            },
        );
        assert_eq!(item.tags(TagField::Label), ["Heist".to_string()]);
        assert_eq!(item.tags(TagField::Genre), ["Crime".to_string()]);
        assert_eq!(item.kind(), MediaKind::Movie);
    }

    #[test]
    fn test_library_kind() {
        let lib = Library {
            key: "1".into(),
            title: "Music".into(),
            section_type: "artist".into(),
        };
        assert_eq!(lib.kind(), None);
    }
}
