use json_patch::Patch;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotations::AnnotationCodec;
use crate::changeset::{Changeset, reconcile_workload};
use crate::fingerprint::Fingerprints;
use crate::workload::{Workload, WorkloadKind};

/// Reasons for letting an admission request through unmodified.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("unsupported kind `{0}`")]
    UnsupportedKind(String),

    #[error("the admission request carries no object")]
    MissingObject,

    #[error("failed to convert the admitted object: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Applies the fingerprint reconciliation to workloads as they are admitted.
///
/// Reads the fingerprints last fetched through the shared handle; it never
/// fetches on its own.
#[derive(Debug, Clone)]
pub struct AdmissionInterceptor {
    codec: AnnotationCodec,
    fingerprints: Fingerprints,
}

impl AdmissionInterceptor {
    pub fn new(codec: AnnotationCodec, fingerprints: Fingerprints) -> Self {
        Self {
            codec,
            fingerprints,
        }
    }

    /// Updates the pod template fingerprints of `workload` in place.
    pub async fn intercept(&self, workload: &mut Workload) -> Changeset {
        let desired = self.fingerprints.snapshot().await;

        reconcile_workload(&self.codec, &desired, workload)
    }

    /// Computes the JSON patch bringing the admitted object up to date.
    ///
    /// Returns `None` when the object already records the current fingerprints.
    pub async fn mutate(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<Option<Patch>, AdmissionError> {
        let kind = WorkloadKind::from_kind(&request.kind.kind)
            .ok_or_else(|| AdmissionError::UnsupportedKind(request.kind.kind.clone()))?;
        let object = request.object.as_ref().ok_or(AdmissionError::MissingObject)?;

        let original = Workload::from_value(kind, serde_json::to_value(object)?)?;
        let mut mutated = original.clone();
        let changeset = self.intercept(&mut mutated).await;
        if changeset.is_empty() {
            return Ok(None);
        }

        Ok(Some(json_patch::diff(
            &original.to_value()?,
            &mutated.to_value()?,
        )))
    }

    /// Answers an admission request.
    ///
    /// The answer always allows the request. It carries a patch when the
    /// object's fingerprints were outdated; any failure is logged and the
    /// object is let through as submitted.
    pub async fn admit(&self, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        let kind = request.kind.kind.as_str();
        let namespace = request.namespace.as_deref().unwrap_or_default();
        let name = request.name.as_str();

        match self.mutate(request).await {
            Ok(Some(patch)) => {
                info!(kind, namespace, name, "patching admitted workload");
                AdmissionResponse::from(request)
                    .with_patch(patch)
                    .unwrap_or_else(|err| {
                        warn!(kind, namespace, name, error = %err, "failed to serialize admission patch");
                        AdmissionResponse::from(request)
                    })
            }
            Ok(None) => {
                debug!(kind, namespace, name, "admitted workload is up to date");
                AdmissionResponse::from(request)
            }
            Err(AdmissionError::MissingObject) => {
                debug!(kind, namespace, name, operation = ?request.operation, "admission request carries no object");
                AdmissionResponse::from(request)
            }
            Err(err) => {
                warn!(kind, namespace, name, error = %err, "letting admitted object through unmodified");
                AdmissionResponse::from(request)
            }
        }
    }
}
