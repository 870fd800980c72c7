use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors emitted by catalog clients.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog rejected the domain's credential.
    #[error("authentication to the catalog api failed for domain `{domain}`")]
    Unauthorized { domain: String },

    /// The catalog answered with a status other than success.
    #[error("the catalog api answered with status {status} for domain `{domain}`")]
    UnexpectedStatus { domain: String, status: u16 },

    /// Request failures, stripped of their url since it carries the domain's key.
    #[error("an error occurred with the catalog http client: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Http(err.without_url())
    }
}

/// Client of the catalog of a single translation domain.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Name of the domain served by this client.
    fn domain(&self) -> &str;

    /// Checks that the domain's credential is accepted by the catalog.
    async fn verify_credential(&self) -> Result<(), CatalogError>;

    /// Returns the raw export of every translation of the domain.
    async fn export_all(&self) -> Result<Bytes, CatalogError>;
}
