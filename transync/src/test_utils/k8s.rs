use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::k8s::{K8sClient, K8sError};
use crate::workload::{Workload, WorkloadKind};

type Key = (WorkloadKind, String, String);

#[derive(Debug, Default)]
struct Inner {
    workloads: BTreeMap<Key, Workload>,
    failing_namespaces: HashSet<String>,
    forced_conflicts: HashMap<String, usize>,
    replace_calls: HashMap<String, usize>,
    next_version: u64,
}

impl Inner {
    fn bump_version(&mut self, workload: &mut Workload) {
        self.next_version += 1;
        workload.metadata_mut().resource_version = Some(self.next_version.to_string());
    }
}

/// [`K8sClient`] storing workloads in memory.
///
/// Replaces are checked against the stored resource version the way the api
/// server does, and conflicts can be forced per workload name.
#[derive(Debug, Default)]
pub struct InMemoryK8sClient {
    inner: Mutex<Inner>,
}

impl InMemoryK8sClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores `workload` in `namespace` under a fresh resource version.
    pub fn insert(&self, namespace: &str, mut workload: Workload) {
        let mut inner = self.inner.lock().unwrap();
        workload.metadata_mut().namespace = Some(namespace.to_owned());
        inner.bump_version(&mut workload);

        let key = (workload.kind(), namespace.to_owned(), workload.name().to_owned());
        inner.workloads.insert(key, workload);
    }

    /// Returns the stored version of a workload.
    pub fn workload(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Option<Workload> {
        let inner = self.inner.lock().unwrap();
        inner
            .workloads
            .get(&(kind, namespace.to_owned(), name.to_owned()))
            .cloned()
    }

    /// Modifies a stored workload as another writer would, bumping its version.
    pub fn update_stored<F>(&self, kind: WorkloadKind, namespace: &str, name: &str, update: F)
    where
        F: FnOnce(&mut Workload),
    {
        let mut inner = self.inner.lock().unwrap();
        let key = (kind, namespace.to_owned(), name.to_owned());
        let Some(mut workload) = inner.workloads.remove(&key) else {
            return;
        };

        update(&mut workload);
        inner.bump_version(&mut workload);
        inner.workloads.insert(key, workload);
    }

    /// Makes every listing in `namespace` fail.
    pub fn fail_listing(&self, namespace: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_namespaces.insert(namespace.to_owned());
    }

    /// Rejects the next `count` replaces of workloads named `name` with a conflict.
    pub fn conflict_next_replaces(&self, name: &str, count: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.forced_conflicts.insert(name.to_owned(), count);
    }

    /// Number of replaces attempted on workloads named `name`.
    pub fn replace_calls(&self, name: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.replace_calls.get(name).copied().unwrap_or_default()
    }

    /// Total number of replaces attempted.
    pub fn total_replace_calls(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.replace_calls.values().sum()
    }
}

/// Matches equality based selectors such as `a=b,c==d` and existence ones such as `a`.
fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|requirement| !requirement.is_empty())
        .all(|requirement| {
            let value_of = |key: &str| labels.and_then(|labels| labels.get(key.trim()));
            match requirement.split_once("!=") {
                Some((key, value)) => value_of(key).map(String::as_str) != Some(value.trim()),
                None => match requirement.split_once('=') {
                    Some((key, value)) => {
                        let value = value.trim_start_matches('=').trim();
                        value_of(key).map(String::as_str) == Some(value)
                    }
                    None => value_of(requirement).is_some(),
                },
            }
        })
}

#[async_trait]
impl K8sClient for InMemoryK8sClient {
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Workload>, K8sError> {
        let inner = self.inner.lock().unwrap();
        if inner.failing_namespaces.contains(namespace) {
            return Err(K8sError::NotFound {
                kind,
                namespace: namespace.to_owned(),
                name: String::new(),
            });
        }

        Ok(inner
            .workloads
            .iter()
            .filter(|((stored_kind, stored_namespace, _), _)| {
                *stored_kind == kind && stored_namespace == namespace
            })
            .filter(|(_, workload)| {
                matches_selector(workload.metadata().labels.as_ref(), label_selector)
            })
            .map(|(_, workload)| workload.clone())
            .collect())
    }

    async fn get_workload(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Workload, K8sError> {
        let inner = self.inner.lock().unwrap();
        inner
            .workloads
            .get(&(kind, namespace.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| K8sError::NotFound {
                kind,
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            })
    }

    async fn replace_workload(
        &self,
        namespace: &str,
        workload: &Workload,
    ) -> Result<Workload, K8sError> {
        let kind = workload.kind();
        let name = workload.name().to_owned();
        if name.is_empty() {
            return Err(K8sError::MissingName(kind));
        }

        let mut inner = self.inner.lock().unwrap();
        *inner.replace_calls.entry(name.clone()).or_default() += 1;

        let conflict = || K8sError::Conflict {
            kind,
            namespace: namespace.to_owned(),
            name: name.clone(),
        };

        if let Some(remaining) = inner.forced_conflicts.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(conflict());
            }
        }

        let key = (kind, namespace.to_owned(), name.clone());
        let Some(stored) = inner.workloads.get(&key) else {
            return Err(K8sError::NotFound {
                kind,
                namespace: namespace.to_owned(),
                name: name.clone(),
            });
        };
        if stored.metadata().resource_version != workload.metadata().resource_version {
            return Err(conflict());
        }

        let mut replaced = workload.clone();
        inner.bump_version(&mut replaced);
        inner.workloads.insert(key, replaced.clone());

        Ok(replaced)
    }
}
