//! Keeps workload pod templates annotated with the content fingerprint of the
//! translation catalogs they depend on.
//!
//! A workload subscribes to catalog domains through the
//! `<prefix>/domains` annotation of its own metadata. The engine computes one
//! fingerprint per domain ([`fingerprint::FingerprintSource`]), diffs it
//! against the `<prefix>/<domain>` annotations of the pod template
//! ([`changeset`]), and writes the stale or missing ones back. Writing the pod
//! template rolls the workload so it reloads its translations.
//!
//! The same diff is delivered two ways: in batch over labelled workloads
//! ([`refresher::Refresher`]) and synchronously at admission time
//! ([`admission::AdmissionInterceptor`]).

pub mod admission;
pub mod annotations;
pub mod catalog;
pub mod changeset;
pub mod fingerprint;
pub mod k8s;
pub mod refresher;
pub mod repository;
pub mod retry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod workload;
