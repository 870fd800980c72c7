use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use transync_config::shared::CatalogConfig;

use crate::catalog::{CatalogClient, CatalogError};

/// Header selecting the version of the catalog api.
const API_VERSION_HEADER: &str = "X-Api-Version";

/// Query parameter carrying the domain's key.
const API_KEY_PARAM: &str = "key";

const AUTH_VERIFY_PATH: &str = "/api/auth/verify";

const EXPORT_ALL_PATH: &str = "/api/export/all";

/// [`CatalogClient`] backed by the Loco HTTP api.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    domain: String,
    api_key: SecretString,
    base_url: String,
    api_version: String,
}

impl HttpCatalogClient {
    pub fn new(
        http: reqwest::Client,
        domain: impl Into<String>,
        api_key: SecretString,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            http,
            domain: domain.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_version: api_version.into(),
        }
    }

    /// Builds one client per configured domain, sharing a single connection pool.
    pub fn from_config(config: &CatalogConfig) -> Result<Vec<Arc<dyn CatalogClient>>, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let clients = config
            .domains
            .iter()
            .map(|(domain, domain_config)| {
                Arc::new(Self::new(
                    http.clone(),
                    domain.clone(),
                    domain_config.api_key.clone().into(),
                    config.base_url.clone(),
                    config.api_version.clone(),
                )) as Arc<dyn CatalogClient>
            })
            .collect();

        Ok(clients)
    }

    async fn get(&self, path: &str) -> Result<Response, CatalogError> {
        debug!(domain = %self.domain, path, "calling the catalog api");

        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(&[(API_KEY_PARAM, self.api_key.expose_secret())])
            .header(API_VERSION_HEADER, self.api_version.as_str())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(CatalogError::Unauthorized {
                domain: self.domain.clone(),
            }),
            status => Err(CatalogError::UnexpectedStatus {
                domain: self.domain.clone(),
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn verify_credential(&self) -> Result<(), CatalogError> {
        self.get(AUTH_VERIFY_PATH).await?;

        Ok(())
    }

    async fn export_all(&self) -> Result<Bytes, CatalogError> {
        let response = self.get(EXPORT_ALL_PATH).await?;

        Ok(response.bytes().await?)
    }
}
