use crate::config::toml_config::{CatalogConfig, LookupStyle};
use crate::core::{ArtworkLocator, CanonicalKey, Resolver};
use crate::utils::error::{Result, SheetError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Looks cards up in a remote catalog over HTTP.
///
/// The request shape (path segment or query parameter) and the location of
/// the artwork path inside the response both come from [`CatalogConfig`].
pub struct CatalogResolver {
    client: Client,
    config: CatalogConfig,
}

impl CatalogResolver {
    pub fn new(client: Client, config: CatalogConfig) -> Self {
        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn lookup_url(&self, key: &CanonicalKey) -> String {
        let path = self.config.lookup_path.trim_end_matches('/');
        match self.config.lookup_style {
            LookupStyle::Path => format!("{}{}/{}", self.base_url(), path, key),
            LookupStyle::Query => format!("{}{}", self.base_url(), path),
        }
    }
}

#[async_trait]
impl Resolver for CatalogResolver {
    async fn resolve(&self, key: &CanonicalKey) -> Result<ArtworkLocator> {
        let url = self.lookup_url(key);
        let mut request = self.client.get(&url);

        if self.config.lookup_style == LookupStyle::Query {
            request = request.query(&[(self.config.query_param.as_str(), key.as_str())]);
        }

        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }

        request = request.timeout(Duration::from_secs(self.config.timeout_seconds));

        tracing::debug!("Catalog request: {}", url);

        let response = request.send().await.map_err(|e| SheetError::LookupError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::NotFound {
                key: key.to_string(),
                reason: format!("catalog responded with {}", status),
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            // 回應內容不是 JSON：視為找不到欄位；傳輸中斷則是查詢失敗
            if e.is_decode() {
                SheetError::NotFound {
                    key: key.to_string(),
                    reason: format!("catalog payload is not JSON: {}", e),
                }
            } else {
                SheetError::LookupError {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let image = payload
            .pointer(&self.config.image_pointer)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SheetError::NotFound {
                key: key.to_string(),
                reason: format!("no artwork at {}", self.config.image_pointer),
            })?;

        Ok(ArtworkLocator::join(self.base_url(), image))
    }
}
