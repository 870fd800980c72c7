//! In-memory collaborators and fixtures for exercising the reconciliation
//! engine without a cluster or a catalog service.
//!
//! Compiled for the crate's own tests and, through the `test-utils` feature,
//! for the tests of dependent crates.
pub mod catalog;
pub mod k8s;
pub mod workloads;
