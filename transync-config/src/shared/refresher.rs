use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::{RetryConfig, ValidationError};

const DEFAULT_ANNOTATION_PREFIX: &str = "translations.example.org";

const DEFAULT_LABEL_SELECTOR: &str = "translations.example.org/refresh=true";

const DEFAULT_NAMESPACE: &str = "default";

/// Workload kinds whose pod templates carry translation fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    DaemonSet,
    Deployment,
    StatefulSet,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::DaemonSet,
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
    ];

    /// Kind name as found in `TypeMeta::kind`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
        }
    }

    /// Looks a kind up by its `TypeMeta::kind` name.
    pub fn from_kind(kind: &str) -> Option<WorkloadKind> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == kind)
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of the batch reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefresherConfig {
    /// Prefix of every annotation read or written, e.g. `translations.example.org`.
    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,
    /// Label selector identifying candidate workloads.
    #[serde(default = "default_label_selector")]
    pub label_selector: String,
    /// Namespaces scanned on every refresh.
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,
    /// Workload kinds scanned on every refresh.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<WorkloadKind>,
    /// Retry policy for conflicting updates.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RefresherConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.namespaces.iter().all(|namespace| namespace.trim().is_empty()) {
            return Err(ValidationError::NoNamespaces);
        }
        if self.kinds.is_empty() {
            return Err(ValidationError::NoWorkloadKinds);
        }
        if self.annotation_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyAnnotationPrefix);
        }
        if self.label_selector.trim().is_empty() {
            return Err(ValidationError::EmptyLabelSelector);
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::RetryMaxAttemptsZero);
        }

        Ok(())
    }
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: default_annotation_prefix(),
            label_selector: default_label_selector(),
            namespaces: default_namespaces(),
            kinds: default_kinds(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_annotation_prefix() -> String {
    DEFAULT_ANNOTATION_PREFIX.to_owned()
}

fn default_label_selector() -> String {
    DEFAULT_LABEL_SELECTOR.to_owned()
}

fn default_namespaces() -> Vec<String> {
    vec![DEFAULT_NAMESPACE.to_owned()]
}

fn default_kinds() -> Vec<WorkloadKind> {
    vec![WorkloadKind::Deployment]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_deserialize_from_lowercase_names() {
        let kinds: Vec<WorkloadKind> =
            serde_json::from_str(r#"["daemonset", "deployment", "statefulset"]"#).unwrap();
        assert_eq!(kinds, WorkloadKind::ALL.to_vec());
    }

    #[test]
    fn kinds_resolve_from_type_meta_names() {
        assert_eq!(WorkloadKind::from_kind("StatefulSet"), Some(WorkloadKind::StatefulSet));
        assert_eq!(WorkloadKind::from_kind("CronJob"), None);
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(RefresherConfig::default().validate(), Ok(()));
    }

    #[test]
    fn blank_namespaces_are_rejected() {
        let config = RefresherConfig {
            namespaces: vec!["  ".to_owned()],
            ..RefresherConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::NoNamespaces));
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let mut config = RefresherConfig::default();
        config.retry.max_attempts = 0;
        assert_eq!(config.validate(), Err(ValidationError::RetryMaxAttemptsZero));
    }
}
