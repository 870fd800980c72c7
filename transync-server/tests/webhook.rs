use reqwest::StatusCode;
use serde_json::{Value, json};
use transync::fingerprint::fingerprint;
use transync_telemetry::init_test_tracing;

use crate::support::test_app::spawn_test_app;

mod support;

const UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

fn review(kind: &str, object: Value) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": UID,
            "kind": {"group": "apps", "version": "v1", "kind": kind},
            "resource": {"group": "apps", "version": "v1", "resource": format!("{}s", kind.to_lowercase())},
            "operation": "CREATE",
            "userInfo": {"username": "system:serviceaccount:kube-system:deployment-controller"},
            "dryRun": false,
            "name": "web",
            "namespace": "default",
            "object": object
        }
    })
}

fn deployment(template_annotations: Value) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": "web",
            "namespace": "default",
            "annotations": {"translations.example.org/domains": "catalog"}
        },
        "spec": {
            "selector": {"matchLabels": {"app": "web"}},
            "template": {
                "metadata": {"labels": {"app": "web"}, "annotations": template_annotations},
                "spec": {"containers": [{"name": "web", "image": "web:1"}]}
            }
        }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn outdated_deployment_is_patched() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    let object = deployment(json!({"translations.example.org/catalog": "stale"}));

    // Act
    let response = app.review("/deployments", &review("Deployment", object)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "AdmissionReview");
    assert_eq!(body["response"]["uid"], UID);
    assert_eq!(body["response"]["allowed"], true);
    assert_eq!(body["response"]["patchType"], "JSONPatch");
    assert!(body["response"]["patch"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn up_to_date_deployment_is_allowed_without_patch() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    let object = deployment(json!({"translations.example.org/catalog": fingerprint(b"v1")}));

    // Act
    let response = app.review("/deployments", &review("Deployment", object)).await;

    // Assert
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["response"]["allowed"], true);
    assert!(body["response"]["patch"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_kind_is_allowed_without_patch() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    let object = json!({"apiVersion": "apps/v1", "kind": "ReplicaSet", "metadata": {"name": "web"}});

    // Act
    let response = app.review("/daemonsets", &review("ReplicaSet", object)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["response"]["allowed"], true);
    assert!(body["response"]["patch"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn review_without_request_is_rejected() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    let review = json!({"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"});

    // Act
    let response = app.review("/statefulsets", &review).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
