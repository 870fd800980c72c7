use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::annotations::AnnotationCodec;
use crate::fingerprint::FingerprintSet;
use crate::workload::Workload;

/// Fingerprint annotations to write, keyed by domain.
pub type Changeset = BTreeMap<String, String>;

/// Computes the fingerprints a workload must record.
///
/// For every subscribed domain known to `desired`, the desired fingerprint is
/// included unless `observed` already holds the same value. Unknown domains
/// are skipped.
pub fn compute_changeset(
    domains: &[String],
    observed: &BTreeMap<String, String>,
    desired: &FingerprintSet,
) -> Changeset {
    let mut changeset = Changeset::new();

    for domain in domains {
        let Some(fingerprint) = desired.get(domain) else {
            warn!(domain, "unknown translation domain");
            continue;
        };

        match observed.get(domain) {
            Some(current) if current == fingerprint => {
                debug!(domain, "translations up to date");
            }
            Some(_) => {
                info!(domain, "translations outdated");
                changeset.insert(domain.clone(), fingerprint.clone());
            }
            None => {
                warn!(domain, "no fingerprint recorded for translation domain");
                changeset.insert(domain.clone(), fingerprint.clone());
            }
        }
    }

    changeset
}

/// Brings the pod template fingerprints of `workload` in line with `desired`.
///
/// Reads the subscriptions from the workload's own annotations and the
/// recorded fingerprints from its pod template, then writes the changeset
/// onto the pod template. Returns the changeset that was written.
pub fn reconcile_workload(
    codec: &AnnotationCodec,
    desired: &FingerprintSet,
    workload: &mut Workload,
) -> Changeset {
    let kind = workload.kind();
    let Some(parts) = workload.parts_mut() else {
        debug!(%kind, "workload has no pod template, skipping");
        return Changeset::new();
    };

    let domains = codec.parse_domains(parts.metadata.annotations.as_ref());
    debug!(%kind, name = parts.name, ?domains, "workload subscribed to translation domains");

    let observed = codec.parse_fingerprints(
        parts
            .template
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.annotations.as_ref()),
    );

    let changeset = compute_changeset(&domains, &observed, desired);
    if !changeset.is_empty() {
        info!(%kind, name = parts.name, ?changeset, "updating translation fingerprints");
    }

    codec.write_changes(parts.template, &changeset);

    changeset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::workloads::deployment;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn domains(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn only_outdated_subscribed_domains_are_included() {
        let desired = map(&[("catalog", "aaa"), ("emails", "bbb"), ("reports", "ccc")]);
        let observed = map(&[("catalog", "aaa")]);

        let changeset = compute_changeset(&domains(&["catalog", "emails"]), &observed, &desired);

        assert_eq!(changeset, map(&[("emails", "bbb")]));
    }

    #[test]
    fn missing_fingerprint_is_written_for_the_first_time() {
        let desired = map(&[("catalog", "aaa")]);

        let changeset = compute_changeset(&domains(&["catalog"]), &BTreeMap::new(), &desired);

        assert_eq!(changeset, map(&[("catalog", "aaa")]));
    }

    #[test]
    fn unknown_domains_are_never_included() {
        let desired = map(&[("catalog", "aaa")]);

        for observed in [map(&[]), map(&[("unknown", "zzz")])] {
            let changeset = compute_changeset(&domains(&["unknown"]), &observed, &desired);
            assert!(changeset.is_empty());
        }
    }

    #[test]
    fn stale_fingerprint_is_replaced() {
        let desired = map(&[("catalog", "new")]);
        let observed = map(&[("catalog", "old")]);

        let changeset = compute_changeset(&domains(&["catalog"]), &observed, &desired);

        assert_eq!(changeset, map(&[("catalog", "new")]));
    }

    #[test]
    fn unsubscribed_domains_are_ignored_even_when_stale() {
        let desired = map(&[("catalog", "new"), ("emails", "bbb")]);
        let observed = map(&[("catalog", "old"), ("emails", "bbb")]);

        let changeset = compute_changeset(&domains(&["emails"]), &observed, &desired);

        assert!(changeset.is_empty());
    }

    #[test]
    fn applying_a_changeset_makes_the_next_one_empty() {
        let desired = map(&[("catalog", "aaa"), ("emails", "bbb"), ("reports", "ccc")]);
        let subscriptions = domains(&["reports", "catalog", "emails", "unknown"]);
        let mut observed = map(&[("catalog", "old"), ("unrelated", "x")]);

        let changeset = compute_changeset(&subscriptions, &observed, &desired);
        assert!(changeset.iter().all(|(domain, value)| {
            subscriptions.contains(domain) && desired.get(domain) == Some(value)
        }));

        observed.extend(changeset);
        assert!(compute_changeset(&subscriptions, &observed, &desired).is_empty());
    }

    #[test]
    fn subscription_order_does_not_change_the_result() {
        let desired = map(&[("catalog", "aaa"), ("emails", "bbb")]);
        let observed = map(&[("emails", "old")]);

        let forward = compute_changeset(&domains(&["catalog", "emails"]), &observed, &desired);
        let backward = compute_changeset(&domains(&["emails", "catalog"]), &observed, &desired);

        assert_eq!(forward, backward);
    }

    #[test]
    fn reconcile_writes_onto_the_pod_template_only() {
        let codec = AnnotationCodec::new("translations.example.org");
        let desired = map(&[("catalog", "aaa"), ("emails", "bbb")]);
        let mut workload = deployment(
            "web",
            &[("translations.example.org/domains", "catalog,emails")],
            &[("translations.example.org/catalog", "aaa")],
        );
        let own_metadata = workload.metadata().clone();

        let changeset = reconcile_workload(&codec, &desired, &mut workload);

        assert_eq!(changeset, map(&[("emails", "bbb")]));
        assert_eq!(workload.metadata(), &own_metadata);
        let template_annotations = workload
            .template()
            .and_then(|template| template.metadata.as_ref())
            .and_then(|metadata| metadata.annotations.clone())
            .unwrap();
        assert_eq!(template_annotations["translations.example.org/emails"], "bbb");
        assert_eq!(template_annotations["translations.example.org/catalog"], "aaa");

        assert!(reconcile_workload(&codec, &desired, &mut workload).is_empty());
    }
}
