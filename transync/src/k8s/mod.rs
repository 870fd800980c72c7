//! Kubernetes integration.
//!
//! The reconciliation only lists, reads and replaces workloads. Consumers
//! depend on the [`K8sClient`] trait; [`http::HttpK8sClient`] implements it
//! with the [`kube`] crate using either an explicit kubeconfig file or the
//! ambient configuration (in-cluster or `~/.kube/config`).

mod base;
pub mod http;

pub use base::*;
