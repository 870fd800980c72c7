use async_trait::async_trait;
use thiserror::Error;

use crate::workload::{Workload, WorkloadKind};

/// Errors emitted by the Kubernetes integration.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The object changed since it was read; the update must be retried on a fresh copy.
    #[error("{kind} `{name}` in namespace `{namespace}` was modified concurrently")]
    Conflict {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },

    #[error("{kind} `{name}` was not found in namespace `{namespace}`")]
    NotFound {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },

    #[error("cannot update a {0} without a name")]
    MissingName(WorkloadKind),

    #[error("An error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),

    #[error("An error occurred while reading the kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

impl K8sError {
    /// Whether the error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, K8sError::Conflict { .. })
    }
}

/// Cluster operations needed by the workload repository.
#[async_trait]
pub trait K8sClient: Send + Sync {
    /// Lists the workloads of `kind` in `namespace` matching `label_selector`.
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Workload>, K8sError>;

    /// Reads the latest version of a workload.
    async fn get_workload(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Workload, K8sError>;

    /// Replaces a workload.
    ///
    /// The update is rejected with [`K8sError::Conflict`] when the workload's
    /// resource version is not the latest one.
    async fn replace_workload(
        &self,
        namespace: &str,
        workload: &Workload,
    ) -> Result<Workload, K8sError>;
}
