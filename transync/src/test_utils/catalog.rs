use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::catalog::{CatalogClient, CatalogError};

#[derive(Debug)]
struct Inner {
    content: Bytes,
    authorized: bool,
    failing: bool,
}

/// [`CatalogClient`] serving a fixed export from memory.
#[derive(Debug)]
pub struct InMemoryCatalogClient {
    domain: String,
    inner: Mutex<Inner>,
}

impl InMemoryCatalogClient {
    pub fn new(domain: &str, content: &str) -> Arc<Self> {
        Arc::new(Self {
            domain: domain.to_owned(),
            inner: Mutex::new(Inner {
                content: Bytes::copy_from_slice(content.as_bytes()),
                authorized: true,
                failing: false,
            }),
        })
    }

    /// A client whose credential is rejected.
    pub fn unauthorized(domain: &str) -> Arc<Self> {
        let client = Self::new(domain, "");
        client.inner.lock().unwrap().authorized = false;

        client
    }

    /// Changes the content served by subsequent exports.
    pub fn set_content(&self, content: &str) {
        self.inner.lock().unwrap().content = Bytes::copy_from_slice(content.as_bytes());
    }

    /// Makes subsequent exports fail with a server error.
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn verify_credential(&self) -> Result<(), CatalogError> {
        if self.inner.lock().unwrap().authorized {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized {
                domain: self.domain.clone(),
            })
        }
    }

    async fn export_all(&self) -> Result<Bytes, CatalogError> {
        let inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(CatalogError::UnexpectedStatus {
                domain: self.domain.clone(),
                status: 500,
            });
        }

        Ok(inner.content.clone())
    }
}
