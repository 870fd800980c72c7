use std::sync::Arc;

use tracing::{error, info, warn};
use transync_config::shared::RetryConfig;

use crate::k8s::{K8sClient, K8sError};
use crate::retry::retry_with_backoff;
use crate::workload::{Workload, WorkloadKind};

/// Outcome of [`WorkloadRepository::persist`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistSummary {
    pub updated: usize,
    pub failed: usize,
}

/// Lists candidate workloads and persists their updates.
pub struct WorkloadRepository {
    client: Arc<dyn K8sClient>,
    label_selector: String,
    retry: RetryConfig,
}

impl WorkloadRepository {
    pub fn new(
        client: Arc<dyn K8sClient>,
        label_selector: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            client,
            label_selector: label_selector.into(),
            retry,
        }
    }

    /// Workloads of `kind` in `namespace` selected for translation refresh.
    ///
    /// A listing failure is logged and treated as "nothing to refresh".
    pub async fn find_candidates(&self, kind: WorkloadKind, namespace: &str) -> Vec<Workload> {
        match self
            .client
            .list_workloads(kind, namespace, &self.label_selector)
            .await
        {
            Ok(workloads) => workloads,
            Err(err) => {
                warn!(%kind, namespace, error = %err, "failed to list workloads");
                Vec::new()
            }
        }
    }

    /// Replaces every workload, one at a time.
    ///
    /// When a replace hits a version conflict the latest object is read
    /// again, `reapply` redoes the modification on it and the replace is
    /// retried with backoff. A workload that still cannot be updated is
    /// logged and skipped; the others are unaffected.
    pub async fn persist<F>(
        &self,
        namespace: &str,
        workloads: Vec<Workload>,
        reapply: F,
    ) -> PersistSummary
    where
        F: Fn(&mut Workload) + Sync,
    {
        let mut summary = PersistSummary::default();

        for workload in workloads {
            let kind = workload.kind();
            let name = workload.name().to_owned();

            match self.replace_with_retry(namespace, workload, &reapply).await {
                Ok(_) => {
                    info!(%kind, namespace, name, "updated workload");
                    summary.updated += 1;
                }
                Err(err) => {
                    error!(%kind, namespace, name, error = %err, "failed to update workload");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    async fn replace_with_retry<F>(
        &self,
        namespace: &str,
        workload: Workload,
        reapply: &F,
    ) -> Result<Workload, K8sError>
    where
        F: Fn(&mut Workload) + Sync,
    {
        let client = &self.client;
        let kind = workload.kind();
        let name = workload.name().to_owned();
        let mut pending = Some(workload);

        retry_with_backoff(&self.retry, K8sError::is_conflict, |attempt| {
            let submitted = pending.take();
            let name = name.as_str();
            async move {
                let candidate = match submitted {
                    Some(workload) => workload,
                    None => {
                        warn!(%kind, namespace, name, attempt, "conflict while updating workload, retrying on the latest version");
                        let mut latest = client.get_workload(kind, namespace, name).await?;
                        reapply(&mut latest);
                        latest
                    }
                };

                client.replace_workload(namespace, &candidate).await
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_utils::k8s::InMemoryK8sClient;
    use crate::test_utils::workloads::{deployment, template_annotations, with_labels};

    const SELECTOR: &str = "translations.example.org/refresh=true";
    const NAMESPACE: &str = "default";

    fn repository(client: &Arc<InMemoryK8sClient>) -> WorkloadRepository {
        WorkloadRepository::new(
            Arc::clone(client) as Arc<dyn K8sClient>,
            SELECTOR,
            RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 1,
                max_delay_ms: 1,
                backoff_factor: 1.0,
            },
        )
    }

    fn annotate(workload: &mut Workload, key: &str, value: &str) {
        let template = workload.parts_mut().unwrap().template;
        template
            .metadata
            .get_or_insert_with(Default::default)
            .annotations
            .get_or_insert_with(Default::default)
            .insert(key.to_owned(), value.to_owned());
    }

    fn labelled(name: &str) -> Workload {
        with_labels(
            deployment(name, &[], &[]),
            &[("translations.example.org/refresh", "true")],
        )
    }

    #[tokio::test]
    async fn finds_only_labelled_workloads() {
        let client = InMemoryK8sClient::new();
        client.insert(NAMESPACE, labelled("web"));
        client.insert(NAMESPACE, deployment("unlabelled", &[], &[]));
        client.insert("other", labelled("elsewhere"));

        let candidates = repository(&client)
            .find_candidates(WorkloadKind::Deployment, NAMESPACE)
            .await;

        let names: Vec<_> = candidates.iter().map(Workload::name).collect();
        assert_eq!(names, vec!["web"]);
    }

    #[tokio::test]
    async fn listing_failure_yields_no_candidates() {
        let client = InMemoryK8sClient::new();
        client.insert(NAMESPACE, labelled("web"));
        client.fail_listing(NAMESPACE);

        let candidates = repository(&client)
            .find_candidates(WorkloadKind::Deployment, NAMESPACE)
            .await;

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn single_conflict_is_retried_without_affecting_other_workloads() {
        let client = InMemoryK8sClient::new();
        client.insert(NAMESPACE, labelled("web"));
        client.insert(NAMESPACE, labelled("api"));
        let repository = repository(&client);
        let mut workloads = repository
            .find_candidates(WorkloadKind::Deployment, NAMESPACE)
            .await;
        for workload in &mut workloads {
            annotate(workload, "translations.example.org/catalog", "aaa");
        }
        client.conflict_next_replaces("web", 1);

        let summary = repository
            .persist(NAMESPACE, workloads, |workload| {
                annotate(workload, "translations.example.org/catalog", "aaa")
            })
            .await;

        assert_eq!(summary, PersistSummary { updated: 2, failed: 0 });
        assert_eq!(client.replace_calls("web"), 2);
        assert_eq!(client.replace_calls("api"), 1);
        for name in ["web", "api"] {
            let stored = client.workload(WorkloadKind::Deployment, NAMESPACE, name).unwrap();
            assert_eq!(template_annotations(&stored)["translations.example.org/catalog"], "aaa");
        }
    }

    #[tokio::test]
    async fn concurrent_update_is_merged_with_the_latest_version() {
        let client = InMemoryK8sClient::new();
        client.insert(NAMESPACE, labelled("web"));
        let repository = repository(&client);
        let mut workloads = repository
            .find_candidates(WorkloadKind::Deployment, NAMESPACE)
            .await;
        annotate(&mut workloads[0], "translations.example.org/catalog", "aaa");
        client.update_stored(WorkloadKind::Deployment, NAMESPACE, "web", |workload| {
            annotate(workload, "kubectl.kubernetes.io/restartedAt", "now")
        });

        let summary = repository
            .persist(NAMESPACE, workloads, |workload| {
                annotate(workload, "translations.example.org/catalog", "aaa")
            })
            .await;

        assert_eq!(summary.updated, 1);
        let stored = client.workload(WorkloadKind::Deployment, NAMESPACE, "web").unwrap();
        let annotations = template_annotations(&stored);
        assert_eq!(annotations["translations.example.org/catalog"], "aaa");
        assert_eq!(annotations["kubectl.kubernetes.io/restartedAt"], "now");
    }

    #[tokio::test]
    async fn exhausted_retries_skip_the_workload_and_continue() {
        let client = InMemoryK8sClient::new();
        client.insert(NAMESPACE, labelled("web"));
        client.insert(NAMESPACE, labelled("api"));
        let repository = repository(&client);
        let workloads = repository
            .find_candidates(WorkloadKind::Deployment, NAMESPACE)
            .await;
        client.conflict_next_replaces("api", 10);

        let summary = repository.persist(NAMESPACE, workloads, |_| {}).await;

        assert_eq!(summary, PersistSummary { updated: 1, failed: 1 });
        assert_eq!(client.replace_calls("api"), 3);
        assert_eq!(client.replace_calls("web"), 1);
    }
}
