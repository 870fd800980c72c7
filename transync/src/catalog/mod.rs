//! Translation catalog integration.
//!
//! The engine only needs two operations from the catalog service: a
//! credential check run once at startup and a full export of a domain, whose
//! bytes are fingerprinted. Consumers depend on [`CatalogClient`]; the
//! default implementation, [`http::HttpCatalogClient`], talks to the Loco
//! HTTP API with one read-only key per domain.

mod base;
pub mod http;

pub use base::*;
