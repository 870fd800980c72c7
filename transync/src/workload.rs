use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;

pub use transync_config::shared::WorkloadKind;

/// A workload whose pod template may carry translation fingerprints.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    DaemonSet(DaemonSet),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
}

/// The parts of a [`Workload`] the reconciliation works on.
pub struct WorkloadParts<'a> {
    pub name: &'a str,
    /// The workload's own metadata, holding the subscriptions.
    pub metadata: &'a ObjectMeta,
    /// The pod template, holding the recorded fingerprints.
    pub template: &'a mut PodTemplateSpec,
}

impl Workload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Workload::DaemonSet(_) => WorkloadKind::DaemonSet,
            Workload::Deployment(_) => WorkloadKind::Deployment,
            Workload::StatefulSet(_) => WorkloadKind::StatefulSet,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Workload::DaemonSet(daemon_set) => &daemon_set.metadata,
            Workload::Deployment(deployment) => &deployment.metadata,
            Workload::StatefulSet(stateful_set) => &stateful_set.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Workload::DaemonSet(daemon_set) => &mut daemon_set.metadata,
            Workload::Deployment(deployment) => &mut deployment.metadata,
            Workload::StatefulSet(stateful_set) => &mut stateful_set.metadata,
        }
    }

    /// Name of the workload, empty when the object has none yet.
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn template(&self) -> Option<&PodTemplateSpec> {
        match self {
            Workload::DaemonSet(daemon_set) => daemon_set.spec.as_ref().map(|spec| &spec.template),
            Workload::Deployment(deployment) => deployment.spec.as_ref().map(|spec| &spec.template),
            Workload::StatefulSet(stateful_set) => {
                stateful_set.spec.as_ref().map(|spec| &spec.template)
            }
        }
    }

    /// Splits the workload into its own metadata and its pod template.
    ///
    /// Returns `None` for a workload without spec.
    pub fn parts_mut(&mut self) -> Option<WorkloadParts<'_>> {
        let (metadata, template) = match self {
            Workload::DaemonSet(daemon_set) => {
                (&daemon_set.metadata, &mut daemon_set.spec.as_mut()?.template)
            }
            Workload::Deployment(deployment) => {
                (&deployment.metadata, &mut deployment.spec.as_mut()?.template)
            }
            Workload::StatefulSet(stateful_set) => {
                (&stateful_set.metadata, &mut stateful_set.spec.as_mut()?.template)
            }
        };

        Some(WorkloadParts {
            name: metadata.name.as_deref().unwrap_or_default(),
            metadata,
            template,
        })
    }

    /// Deserializes a workload of the given kind from its JSON representation.
    pub fn from_value(kind: WorkloadKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            WorkloadKind::DaemonSet => Workload::DaemonSet(serde_json::from_value(value)?),
            WorkloadKind::Deployment => Workload::Deployment(serde_json::from_value(value)?),
            WorkloadKind::StatefulSet => Workload::StatefulSet(serde_json::from_value(value)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Workload::DaemonSet(daemon_set) => serde_json::to_value(daemon_set),
            Workload::Deployment(deployment) => serde_json::to_value(deployment),
            Workload::StatefulSet(stateful_set) => serde_json::to_value(stateful_set),
        }
    }
}

impl From<DaemonSet> for Workload {
    fn from(daemon_set: DaemonSet) -> Self {
        Workload::DaemonSet(daemon_set)
    }
}

impl From<Deployment> for Workload {
    fn from(deployment: Deployment) -> Self {
        Workload::Deployment(deployment)
    }
}

impl From<StatefulSet> for Workload {
    fn from(stateful_set: StatefulSet) -> Self {
        Workload::StatefulSet(stateful_set)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pod_template() -> Value {
        json!({
            "metadata": {"labels": {"app": "web"}},
            "spec": {"containers": [{"name": "web", "image": "web:1"}]}
        })
    }

    #[test]
    fn every_kind_exposes_its_pod_template() {
        let objects = [
            (
                WorkloadKind::DaemonSet,
                json!({"metadata": {"name": "agent"}, "spec": {"selector": {}, "template": pod_template()}}),
            ),
            (
                WorkloadKind::Deployment,
                json!({"metadata": {"name": "web"}, "spec": {"selector": {}, "template": pod_template()}}),
            ),
            (
                WorkloadKind::StatefulSet,
                json!({"metadata": {"name": "db"}, "spec": {"selector": {}, "serviceName": "db", "template": pod_template()}}),
            ),
        ];

        for (kind, object) in objects {
            let mut workload = Workload::from_value(kind, object).unwrap();
            assert_eq!(workload.kind(), kind);

            let parts = workload.parts_mut().unwrap();
            assert!(!parts.name.is_empty());
            assert!(parts.template.spec.is_some());
        }
    }

    #[test]
    fn workload_without_spec_has_no_parts() {
        let mut workload: Workload = Deployment {
            metadata: ObjectMeta {
                name: Some("web".to_owned()),
                ..ObjectMeta::default()
            },
            ..Deployment::default()
        }
        .into();

        assert_eq!(workload.name(), "web");
        assert!(workload.template().is_none());
        assert!(workload.parts_mut().is_none());
    }

    #[test]
    fn serialized_workload_carries_its_type_meta() {
        let workload: Workload = StatefulSet::default().into();

        let value = workload.to_value().unwrap();

        assert_eq!(value["kind"], "StatefulSet");
        assert_eq!(value["apiVersion"], "apps/v1");
    }
}
