use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

use crate::catalog::{CatalogClient, CatalogError};

/// Fingerprint of every tracked domain, keyed by domain name.
pub type FingerprintSet = BTreeMap<String, String>;

/// Errors returned by [`FingerprintSource::fetch`].
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("failed to export catalog domain `{domain}`: {source}")]
    Export {
        domain: String,
        #[source]
        source: CatalogError,
    },

    #[error("a fingerprint task did not complete: {0}")]
    Task(#[from] JoinError),
}

/// Shared handle on the last fetched [`FingerprintSet`].
///
/// Clones share the same underlying set. Consumers take one [`snapshot`] per
/// reconciliation pass so every decision of the pass sees the same values.
///
/// [`snapshot`]: Fingerprints::snapshot
#[derive(Debug, Clone, Default)]
pub struct Fingerprints {
    inner: Arc<RwLock<FingerprintSet>>,
}

impl Fingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current values.
    pub async fn snapshot(&self) -> FingerprintSet {
        self.inner.read().await.clone()
    }

    /// Replaces the given entries one by one, keeping the others.
    async fn replace_values(&self, values: FingerprintSet) {
        let mut inner = self.inner.write().await;
        for (domain, value) in values {
            inner.insert(domain, value);
        }
    }
}

impl From<FingerprintSet> for Fingerprints {
    fn from(values: FingerprintSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }
}

/// Hex encoded SHA-256 digest of a catalog export.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Computes the fingerprint of every configured domain.
///
/// Owns the [`Fingerprints`] handle shared with the refresher and the
/// admission interceptor; [`fetch`](FingerprintSource::fetch) updates it in
/// place so handles obtained earlier observe the new values.
pub struct FingerprintSource {
    clients: Vec<Arc<dyn CatalogClient>>,
    fingerprints: Fingerprints,
}

impl FingerprintSource {
    pub fn new(clients: Vec<Arc<dyn CatalogClient>>) -> Self {
        Self {
            clients,
            fingerprints: Fingerprints::new(),
        }
    }

    /// Handle on the fingerprints, empty until the first successful fetch.
    pub fn fingerprints(&self) -> Fingerprints {
        self.fingerprints.clone()
    }

    /// Checks the credential of every domain against the catalog.
    ///
    /// Meant to run once at startup: any rejected credential is returned and
    /// must stop the service before it starts serving.
    pub async fn verify_credentials(&self) -> Result<(), CatalogError> {
        info!(
            domains = self.clients.len(),
            "checking connectivity to the catalog api"
        );

        try_join_all(self.clients.iter().map(|client| client.verify_credential())).await?;

        Ok(())
    }

    /// Exports every domain in parallel and fingerprints the exports.
    ///
    /// Either every domain is refreshed or none is: the first failure aborts
    /// the remaining exports and is returned without touching the shared set.
    pub async fn fetch(&self) -> Result<Fingerprints, FingerprintError> {
        let mut tasks = JoinSet::new();
        for client in &self.clients {
            let client = Arc::clone(client);
            tasks.spawn(async move {
                let domain = client.domain().to_owned();
                match client.export_all().await {
                    Ok(content) => Ok((domain, fingerprint(&content))),
                    Err(source) => Err(FingerprintError::Export { domain, source }),
                }
            });
        }

        let mut fetched = FingerprintSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(FingerprintError::from).and_then(|result| result) {
                Ok((domain, value)) => {
                    fetched.insert(domain, value);
                }
                Err(err) => {
                    tasks.shutdown().await;
                    error!(error = %err, "failed to refresh catalog fingerprints");

                    return Err(err);
                }
            }
        }

        info!(fingerprints = ?fetched, "refreshed catalog fingerprints");
        self.fingerprints.replace_values(fetched).await;

        Ok(self.fingerprints())
    }
}
