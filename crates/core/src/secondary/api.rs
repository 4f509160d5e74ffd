use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{SecondaryCatalogError, SystemStatus};
use crate::config::ServiceConfig;

const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP plumbing shared by the Radarr and Sonarr v3 APIs.
pub(super) struct ArrApi {
    service: &'static str,
    client: Client,
    base_url: String,
    api_key: String,
}

impl ArrApi {
    pub(super) fn new(
        service: &'static str,
        config: &ServiceConfig,
    ) -> Result<Self, SecondaryCatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            service,
            client,
            base_url: config
                .url
                .as_deref()
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    pub(super) fn service(&self) -> &'static str {
        self.service
    }

    pub(super) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, SecondaryCatalogError> {
        let url = format!("{}/api/v3/{}", self.base_url, path);

        debug!("{} GET {}", self.service, path);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(SecondaryCatalogError::Unauthorized(self.service.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SecondaryCatalogError::ApiError {
                service: self.service.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            SecondaryCatalogError::ParseError(format!("{} {}: {}", self.service, path, e))
        })
    }

    pub(super) async fn system_status(&self) -> Result<SystemStatus, SecondaryCatalogError> {
        let status: StatusResponse = self.get("system/status").await?;
        Ok(SystemStatus {
            app_name: status.app_name.unwrap_or_else(|| self.service.to_string()),
            version: status.version,
        })
    }
}

// ============================================================================
// Shared API response types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlternateTitle {
    pub title: String,
}

/// Zero is used by both services for "unknown".
pub(super) fn known_id(id: Option<u64>) -> Option<u64> {
    id.filter(|id| *id > 0)
}

/// Empty strings are used for missing imdb ids.
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_id() {
        assert_eq!(known_id(Some(603)), Some(603));
        assert_eq!(known_id(Some(0)), None);
        assert_eq!(known_id(None), None);
    }

    #[test]
    fn test_parse_status() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"appName":"Radarr","version":"5.2.6.8376"}"#).unwrap();
        assert_eq!(status.app_name.as_deref(), Some("Radarr"));
        assert_eq!(status.version, "5.2.6.8376");
    }

    #[test]
    fn test_base_url_trimmed() {
        let api = ArrApi::new(
            "Radarr",
            &ServiceConfig {
                enabled: true,
                url: Some("http://radarr:7878/".to_string()),
                api_key: Some("k".to_string()),
                timeout_secs: 5,
            },
        )
        .unwrap();
        assert_eq!(api.base_url, "http://radarr:7878");
        assert_eq!(api.service(), "Radarr");
    }
}
