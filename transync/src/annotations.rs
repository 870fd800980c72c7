use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PodTemplateSpec;

use crate::changeset::Changeset;

/// Name of the annotation listing the subscribed domains, under the prefix.
pub const DOMAINS_ANNOTATION: &str = "domains";

/// Separator of the subscribed domains list.
const DOMAINS_SEPARATOR: char = ',';

/// Reads and writes the translation annotations of a workload.
///
/// Subscriptions live on the workload's own metadata as
/// `<prefix>/domains: catalog,emails`. Fingerprints live on the pod template
/// metadata as `<prefix>/<domain>: <fingerprint>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationCodec {
    prefix: String,
}

impl AnnotationCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// Full key of the subscription annotation.
    pub fn domains_key(&self) -> String {
        format!("{}/{DOMAINS_ANNOTATION}", self.prefix)
    }

    /// Full key of the fingerprint annotation of `domain`.
    pub fn fingerprint_key(&self, domain: &str) -> String {
        format!("{}/{domain}", self.prefix)
    }

    /// Domains a workload subscribes to, in declaration order.
    pub fn parse_domains(&self, annotations: Option<&BTreeMap<String, String>>) -> Vec<String> {
        annotations
            .and_then(|annotations| annotations.get(&self.domains_key()))
            .map(|domains| {
                domains
                    .split(DOMAINS_SEPARATOR)
                    .map(str::trim)
                    .filter(|domain| !domain.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fingerprints recorded on a pod template, keyed by domain.
    pub fn parse_fingerprints(
        &self,
        annotations: Option<&BTreeMap<String, String>>,
    ) -> BTreeMap<String, String> {
        let Some(annotations) = annotations else {
            return BTreeMap::new();
        };

        annotations
            .iter()
            .filter_map(|(key, value)| {
                let domain = key.strip_prefix(&self.prefix)?.strip_prefix('/')?;
                (!domain.is_empty() && domain != DOMAINS_ANNOTATION)
                    .then(|| (domain.to_owned(), value.clone()))
            })
            .collect()
    }

    /// Writes every changeset entry onto the pod template annotations.
    ///
    /// Other annotations are left untouched.
    pub fn write_changes(&self, template: &mut PodTemplateSpec, changeset: &Changeset) {
        if changeset.is_empty() {
            return;
        }

        let annotations = template
            .metadata
            .get_or_insert_with(Default::default)
            .annotations
            .get_or_insert_with(BTreeMap::new);

        for (domain, fingerprint) in changeset {
            annotations.insert(self.fingerprint_key(domain), fingerprint.clone());
        }
    }
}
