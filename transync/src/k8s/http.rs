use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use kube::api::{ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::k8s::{K8sClient, K8sError};
use crate::workload::{Workload, WorkloadKind};

/// HTTP status returned by the api server on a resource version mismatch.
const CONFLICT_STATUS: u16 = 409;

const NOT_FOUND_STATUS: u16 = 404;

/// [`K8sClient`] backed by [`kube`].
#[derive(Clone)]
pub struct HttpK8sClient {
    client: Client,
}

impl HttpK8sClient {
    /// Connects with the kubeconfig at `kubeconfig` when that file exists,
    /// with the ambient configuration otherwise.
    pub async fn new(kubeconfig: Option<&str>) -> Result<HttpK8sClient, K8sError> {
        let client = match kubeconfig.filter(|path| Path::new(path).exists()) {
            Some(path) => {
                info!(path, "using kubeconfig file");
                let kubeconfig = Kubeconfig::read_from(path)?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await?;
                Client::try_from(config)?
            }
            None => {
                info!("using in-cluster or default kube configuration");
                Client::try_default().await?
            }
        };

        Ok(HttpK8sClient { client })
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn list<K>(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let params = ListParams::default().labels(label_selector);
        let list = self.api::<K>(namespace).list(&params).await?;

        Ok(list.items)
    }

    async fn replace<K>(&self, namespace: &str, name: &str, object: &K) -> Result<K, kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        self.api::<K>(namespace)
            .replace(name, &PostParams::default(), object)
            .await
    }
}

/// Maps api server statuses the repository reacts to onto dedicated variants.
fn map_api_error(kind: WorkloadKind, namespace: &str, name: &str, err: kube::Error) -> K8sError {
    match &err {
        kube::Error::Api(response) if response.code == CONFLICT_STATUS => K8sError::Conflict {
            kind,
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        },
        kube::Error::Api(response) if response.code == NOT_FOUND_STATUS => K8sError::NotFound {
            kind,
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        },
        _ => K8sError::Kube(err),
    }
}

#[async_trait]
impl K8sClient for HttpK8sClient {
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Workload>, K8sError> {
        let workloads = match kind {
            WorkloadKind::DaemonSet => self
                .list::<DaemonSet>(namespace, label_selector)
                .await?
                .into_iter()
                .map(Workload::from)
                .collect(),
            WorkloadKind::Deployment => self
                .list::<Deployment>(namespace, label_selector)
                .await?
                .into_iter()
                .map(Workload::from)
                .collect(),
            WorkloadKind::StatefulSet => self
                .list::<StatefulSet>(namespace, label_selector)
                .await?
                .into_iter()
                .map(Workload::from)
                .collect(),
        };

        Ok(workloads)
    }

    async fn get_workload(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Workload, K8sError> {
        let workload = match kind {
            WorkloadKind::DaemonSet => self
                .api::<DaemonSet>(namespace)
                .get(name)
                .await
                .map(Workload::from),
            WorkloadKind::Deployment => self
                .api::<Deployment>(namespace)
                .get(name)
                .await
                .map(Workload::from),
            WorkloadKind::StatefulSet => self
                .api::<StatefulSet>(namespace)
                .get(name)
                .await
                .map(Workload::from),
        };

        workload.map_err(|err| map_api_error(kind, namespace, name, err))
    }

    async fn replace_workload(
        &self,
        namespace: &str,
        workload: &Workload,
    ) -> Result<Workload, K8sError> {
        let kind = workload.kind();
        let name = workload.name();
        if name.is_empty() {
            return Err(K8sError::MissingName(kind));
        }

        let replaced = match workload {
            Workload::DaemonSet(daemon_set) => self
                .replace(namespace, name, daemon_set)
                .await
                .map(Workload::from),
            Workload::Deployment(deployment) => self
                .replace(namespace, name, deployment)
                .await
                .map(Workload::from),
            Workload::StatefulSet(stateful_set) => self
                .replace(namespace, name, stateful_set)
                .await
                .map(Workload::from),
        };

        replaced.map_err(|err| map_api_error(kind, namespace, name, err))
    }
}
