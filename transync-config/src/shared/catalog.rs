use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::SerializableSecretString;
use crate::shared::ValidationError;

const DEFAULT_CATALOG_BASE_URL: &str = "https://localise.biz";

const DEFAULT_CATALOG_API_VERSION: &str = "1.0.25";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Access to the translation catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value sent in the `X-Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Timeout applied to every catalog request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Tracked domains, keyed by domain name.
    #[serde(default)]
    pub domains: BTreeMap<String, CatalogDomainConfig>,
}

/// Credentials of a single catalog domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDomainConfig {
    /// Read-only export key of the domain's project.
    pub api_key: SerializableSecretString,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.domains.iter().find(|(_, domain)| domain.api_key.is_blank()) {
            Some((name, _)) => Err(ValidationError::EmptyApiKey(name.clone())),
            None => Ok(()),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            domains: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_CATALOG_BASE_URL.to_owned()
}

fn default_api_version() -> String {
    DEFAULT_CATALOG_API_VERSION.to_owned()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
