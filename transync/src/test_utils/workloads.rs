use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{
    DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec,
};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::workload::Workload;

fn annotations(entries: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    if entries.is_empty() {
        return None;
    }

    Some(
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    )
}

fn metadata(name: &str, annotations_entries: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some("default".to_owned()),
        annotations: annotations(annotations_entries),
        ..ObjectMeta::default()
    }
}

fn selector(name: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some([("app".to_owned(), name.to_owned())].into()),
        ..LabelSelector::default()
    }
}

fn pod_template(name: &str, template_annotations: &[(&str, &str)]) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some([("app".to_owned(), name.to_owned())].into()),
            annotations: annotations(template_annotations),
            ..ObjectMeta::default()
        }),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: name.to_owned(),
                image: Some(format!("{name}:latest")),
                ..Container::default()
            }],
            ..PodSpec::default()
        }),
    }
}

/// Builds a deployment with the given own and pod template annotations.
pub fn deployment(
    name: &str,
    own_annotations: &[(&str, &str)],
    template_annotations: &[(&str, &str)],
) -> Workload {
    Deployment {
        metadata: metadata(name, own_annotations),
        spec: Some(DeploymentSpec {
            selector: selector(name),
            template: pod_template(name, template_annotations),
            ..DeploymentSpec::default()
        }),
        ..Default::default()
    }
    .into()
}

/// Builds a daemon set with the given own and pod template annotations.
pub fn daemon_set(
    name: &str,
    own_annotations: &[(&str, &str)],
    template_annotations: &[(&str, &str)],
) -> Workload {
    DaemonSet {
        metadata: metadata(name, own_annotations),
        spec: Some(DaemonSetSpec {
            selector: selector(name),
            template: pod_template(name, template_annotations),
            ..DaemonSetSpec::default()
        }),
        ..Default::default()
    }
    .into()
}

/// Builds a stateful set with the given own and pod template annotations.
pub fn stateful_set(
    name: &str,
    own_annotations: &[(&str, &str)],
    template_annotations: &[(&str, &str)],
) -> Workload {
    StatefulSet {
        metadata: metadata(name, own_annotations),
        spec: Some(StatefulSetSpec {
            selector: selector(name),
            template: pod_template(name, template_annotations),
            ..StatefulSetSpec::default()
        }),
        ..Default::default()
    }
    .into()
}

/// Adds `labels` to the workload's own metadata.
pub fn with_labels(mut workload: Workload, labels: &[(&str, &str)]) -> Workload {
    let existing = workload
        .metadata_mut()
        .labels
        .get_or_insert_with(BTreeMap::new);
    for (key, value) in labels {
        existing.insert(key.to_string(), value.to_string());
    }

    workload
}

/// Annotations of the workload's pod template, empty when it has none.
pub fn template_annotations(workload: &Workload) -> BTreeMap<String, String> {
    workload
        .template()
        .and_then(|template| template.metadata.as_ref())
        .and_then(|metadata| metadata.annotations.clone())
        .unwrap_or_default()
}
