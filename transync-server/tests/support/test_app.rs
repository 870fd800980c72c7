#![allow(dead_code)]

use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use reqwest::Response;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use transync::admission::AdmissionInterceptor;
use transync::annotations::AnnotationCodec;
use transync::catalog::CatalogClient;
use transync::fingerprint::{FingerprintError, FingerprintSource};
use transync::k8s::K8sClient;
use transync::refresher::Refresher;
use transync::test_utils::catalog::InMemoryCatalogClient;
use transync::test_utils::k8s::InMemoryK8sClient;
use transync_config::shared::{RefresherConfig, RetryConfig, WorkloadKind};
use transync_server::startup::{run_api, run_webhook};
use transync_server::sync::SyncContext;

pub const PREFIX: &str = "translations.example.org";

pub struct TestApp {
    pub address: String,
    pub webhook_address: String,
    pub api_client: reqwest::Client,
    pub catalog: Arc<InMemoryCatalogClient>,
    pub k8s_client: Arc<InMemoryK8sClient>,
    pub fatal_rx: mpsc::UnboundedReceiver<FingerprintError>,
    api_handle: JoinHandle<io::Result<()>>,
    webhook_handle: JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub async fn health_check(&self) -> Response {
        self.api_client
            .get(format!("{}/health_check", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn refresh(&self) -> Response {
        self.api_client
            .post(format!("{}/refresh", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn review(&self, path: &str, review: &Value) -> Response {
        self.api_client
            .post(format!("{}{path}", self.webhook_address))
            .json(review)
            .send()
            .await
            .expect("failed to execute request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.api_handle.abort();
        self.webhook_handle.abort();
    }
}

fn refresher_config() -> RefresherConfig {
    RefresherConfig {
        annotation_prefix: PREFIX.to_owned(),
        label_selector: format!("{PREFIX}/refresh=true"),
        namespaces: vec!["default".to_owned()],
        kinds: vec![WorkloadKind::Deployment],
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 1,
            backoff_factor: 1.0,
        },
    }
}

fn bind_random_port() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    (listener, format!("http://127.0.0.1:{port}"))
}

/// Spawns the api and the webhook over plain http, backed by in-memory
/// collaborators. The `catalog` domain serves `v1` and is already fetched.
pub async fn spawn_test_app() -> TestApp {
    let catalog = InMemoryCatalogClient::new("catalog", "v1");
    let k8s_client = InMemoryK8sClient::new();

    let source = Arc::new(FingerprintSource::new(vec![
        Arc::clone(&catalog) as Arc<dyn CatalogClient>
    ]));
    source.fetch().await.expect("failed to fetch fingerprints");

    let config = refresher_config();
    let refresher = Arc::new(Refresher::from_config(
        Arc::clone(&k8s_client) as Arc<dyn K8sClient>,
        &config,
    ));
    let interceptor =
        AdmissionInterceptor::new(AnnotationCodec::new(PREFIX), source.fingerprints());
    let (sync, fatal_rx) = SyncContext::new(source, refresher);

    let (api_listener, address) = bind_random_port();
    let api_server = run_api(api_listener, Arc::new(sync)).expect("failed to start the api");
    let api_handle = tokio::spawn(api_server);

    let (webhook_listener, webhook_address) = bind_random_port();
    let webhook_server =
        run_webhook(webhook_listener, interceptor, None).expect("failed to start the webhook");
    let webhook_handle = tokio::spawn(webhook_server);

    TestApp {
        address,
        webhook_address,
        api_client: reqwest::Client::new(),
        catalog,
        k8s_client,
        fatal_rx,
        api_handle,
        webhook_handle,
    }
}
