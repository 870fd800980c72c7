use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use transync_config::shared::RefresherConfig;

use crate::annotations::AnnotationCodec;
use crate::changeset::reconcile_workload;
use crate::fingerprint::FingerprintSet;
use crate::k8s::K8sClient;
use crate::repository::WorkloadRepository;
use crate::workload::WorkloadKind;

/// Outcome of one [`Refresher::refresh`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Workloads selected by the label selector.
    pub candidates: usize,
    /// Candidates with at least one stale or missing fingerprint.
    pub outdated: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Batch reconciliation of every labelled workload.
pub struct Refresher {
    repository: WorkloadRepository,
    codec: AnnotationCodec,
    namespaces: Vec<String>,
    kinds: Vec<WorkloadKind>,
}

impl Refresher {
    pub fn new(
        repository: WorkloadRepository,
        codec: AnnotationCodec,
        namespaces: Vec<String>,
        kinds: Vec<WorkloadKind>,
    ) -> Self {
        Self {
            repository,
            codec,
            namespaces,
            kinds,
        }
    }

    pub fn from_config(client: Arc<dyn K8sClient>, config: &RefresherConfig) -> Self {
        let repository = WorkloadRepository::new(
            client,
            config.label_selector.clone(),
            config.retry.clone(),
        );
        let namespaces = config
            .namespaces
            .iter()
            .map(|namespace| namespace.trim())
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_owned)
            .collect();

        Self::new(
            repository,
            AnnotationCodec::new(config.annotation_prefix.clone()),
            namespaces,
            config.kinds.clone(),
        )
    }

    /// Reconciles the candidates of every namespace and kind against `desired`.
    ///
    /// Only workloads whose fingerprints changed are written. A namespace that
    /// cannot be listed and a workload that cannot be written are skipped.
    pub async fn refresh(&self, desired: &FingerprintSet) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for namespace in &self.namespaces {
            for &kind in &self.kinds {
                let candidates = self.repository.find_candidates(kind, namespace).await;
                summary.candidates += candidates.len();

                let outdated: Vec<_> = candidates
                    .into_iter()
                    .filter_map(|mut workload| {
                        let changeset = reconcile_workload(&self.codec, desired, &mut workload);
                        (!changeset.is_empty()).then_some(workload)
                    })
                    .collect();
                if outdated.is_empty() {
                    continue;
                }
                summary.outdated += outdated.len();

                let persisted = self
                    .repository
                    .persist(namespace, outdated, |workload| {
                        reconcile_workload(&self.codec, desired, workload);
                    })
                    .await;
                summary.updated += persisted.updated;
                summary.failed += persisted.failed;
            }
        }

        if summary.failed > 0 {
            warn!(?summary, "refresh completed with failures");
        } else {
            info!(?summary, "refresh completed");
        }

        summary
    }
}
