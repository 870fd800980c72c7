//! Server running the translation fingerprint reconciliation.
//!
//! Verifies the catalog credentials, fetches the fingerprints, then keeps
//! workloads up to date three ways: on a fixed schedule, on demand through
//! `POST /refresh`, and at admission time through a mutating webhook.

pub mod config;
pub mod core;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod sync;
pub mod tls;
