//! Sonarr v3 client.

use async_trait::async_trait;
use serde::Deserialize;

use super::api::{known_id, non_empty, AlternateTitle, ArrApi};
use super::{SecondaryCatalog, SecondaryCatalogError, SecondaryEntry, SystemStatus};
use crate::config::ServiceConfig;

/// Sonarr API client.
pub struct SonarrClient {
    api: ArrApi,
}

impl SonarrClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, SecondaryCatalogError> {
        Ok(Self {
            api: ArrApi::new("Sonarr", config)?,
        })
    }
}

#[async_trait]
impl SecondaryCatalog for SonarrClient {
    fn name(&self) -> &str {
        self.api.service()
    }

    async fn entries(&self) -> Result<Vec<SecondaryEntry>, SecondaryCatalogError> {
        let series: Vec<SonarrSeries> = self.api.get("series").await?;
        Ok(series.into_iter().map(Into::into).collect())
    }

    async fn system_status(&self) -> Result<SystemStatus, SecondaryCatalogError> {
        self.api.system_status().await
    }
}

// ============================================================================
// Sonarr API response types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    title: String,
    #[serde(default)]
    sort_title: Option<String>,
    #[serde(default)]
    alternate_titles: Vec<AlternateTitle>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    tvdb_id: Option<u64>,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

impl From<SonarrSeries> for SecondaryEntry {
    fn from(s: SonarrSeries) -> Self {
        SecondaryEntry {
            title: s.title,
            original_title: non_empty(s.sort_title),
            alternate_titles: s.alternate_titles.into_iter().map(|t| t.title).collect(),
            year: s.year.filter(|y| *y > 0),
            tmdb_id: known_id(s.tmdb_id),
            imdb_id: non_empty(s.imdb_id),
            tvdb_id: known_id(s.tvdb_id),
            path: non_empty(s.path),
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_series() {
        let series: Vec<SonarrSeries> = serde_json::from_str(
            r#"[{
                "title":"Game of Thrones","sortTitle":"game thrones","year":2011,
                "tvdbId":121361,"tmdbId":1399,"imdbId":"tt0944947",
                "path":"/tv/Game of Thrones",
                "alternateTitles":[{"title":"GoT","seasonNumber":-1}]
            }]"#,
        )
        .unwrap();

        let entry: SecondaryEntry = series.into_iter().next().unwrap().into();
        assert_eq!(entry.tvdb_id, Some(121361));
        assert_eq!(entry.tmdb_id, Some(1399));
        assert_eq!(entry.path.as_deref(), Some("/tv/Game of Thrones"));
        assert_eq!(entry.titles().collect::<Vec<_>>(), vec!["Game of Thrones", "game thrones", "GoT"]);
    }
}
