use std::future::pending;
use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::ServerHandle;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};
use transync::admission::AdmissionInterceptor;
use transync::annotations::AnnotationCodec;
use transync::catalog::http::HttpCatalogClient;
use transync::fingerprint::{FingerprintError, FingerprintSource};
use transync::k8s::K8sClient;
use transync::k8s::http::HttpK8sClient;
use transync::refresher::Refresher;
use transync_config::shared::{
    CatalogConfig, RefresherConfig, SchedulerConfig, ServerConfig, WebhookConfig,
};

use crate::scheduler::Scheduler;
use crate::startup::{run_api, run_webhook};
use crate::sync::SyncContext;
use crate::tls::{install_crypto_provider, load_server_tls_config};

/// Starts the service and runs it until a fatal error or a shutdown signal.
///
/// The catalog credentials are verified and the fingerprints fetched before
/// anything is served: a failure of either stops the service right away.
pub async fn start_service_with_config(config: ServerConfig) -> anyhow::Result<()> {
    info!("starting transync service");

    log_config(&config);

    install_crypto_provider();

    let k8s_client =
        Arc::new(HttpK8sClient::new(config.kubeconfig.as_deref()).await?) as Arc<dyn K8sClient>;

    let source = Arc::new(FingerprintSource::new(HttpCatalogClient::from_config(
        &config.catalog,
    )?));
    source.verify_credentials().await?;
    source.fetch().await?;

    let refresher = Arc::new(Refresher::from_config(k8s_client, &config.refresher));
    let interceptor = AdmissionInterceptor::new(
        AnnotationCodec::new(config.refresher.annotation_prefix.clone()),
        source.fingerprints(),
    );
    let (sync, mut fatal_rx) = SyncContext::new(source, refresher);
    let sync = Arc::new(sync);

    let api_listener = TcpListener::bind(config.application.to_string())?;
    info!(address = %config.application, "starting api server");
    let api_server = run_api(api_listener, Arc::clone(&sync))?;
    let api_server_handle = api_server.handle();
    let mut api_task = tokio::spawn(api_server);

    let mut webhook = start_webhook(&config.webhook, interceptor)?;

    let mut background = tokio::spawn(run_background(Arc::clone(&sync), config.scheduler));

    let result = tokio::select! {
        result = &mut api_task => server_outcome("api", result),
        result = wait_webhook(&mut webhook) => server_outcome("webhook", result),
        result = &mut background => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(err) => Err(err.into()),
        },
        Some(err) = fatal_rx.recv() => Err(err.into()),
        result = shutdown_signal() => result,
    };

    background.abort();
    api_server_handle.stop(true).await;
    if let Some((handle, _)) = &webhook {
        handle.stop(true).await;
    }

    if result.is_ok() {
        info!("transync service stopped");
    }

    result
}

type WebhookTask = (ServerHandle, JoinHandle<std::io::Result<()>>);

fn start_webhook(
    config: &WebhookConfig,
    interceptor: AdmissionInterceptor,
) -> anyhow::Result<Option<WebhookTask>> {
    if !config.enabled {
        info!("admission webhook disabled");
        return Ok(None);
    }

    let tls = match (&config.tls_cert_file, &config.tls_private_key_file) {
        (Some(cert_file), Some(private_key_file)) => {
            Some(load_server_tls_config(cert_file, private_key_file)?)
        }
        _ => {
            warn!("admission webhook served without tls");
            None
        }
    };

    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)?;
    info!(address, "starting admission webhook");

    let server = run_webhook(listener, interceptor, tls)?;
    let handle = server.handle();

    Ok(Some((handle, tokio::spawn(server))))
}

async fn wait_webhook(
    webhook: &mut Option<WebhookTask>,
) -> Result<std::io::Result<()>, JoinError> {
    match webhook {
        Some((_, task)) => task.await,
        None => pending().await,
    }
}

fn server_outcome(
    name: &str,
    result: Result<std::io::Result<()>, JoinError>,
) -> anyhow::Result<()> {
    match result {
        Ok(Ok(())) => {
            info!(server = name, "server stopped");
            Ok(())
        }
        Ok(Err(err)) => Err(anyhow::Error::from(err).context(format!("the {name} server failed"))),
        Err(err) => Err(anyhow::Error::from(err).context(format!("the {name} server panicked"))),
    }
}

/// Refreshes the workloads once, then runs the scheduler when enabled.
///
/// Only returns when a scheduled fetch fails.
async fn run_background(
    sync: Arc<SyncContext>,
    scheduler: SchedulerConfig,
) -> Result<(), FingerprintError> {
    sync.refresh().await;

    if !scheduler.enabled {
        info!("scheduler disabled, workloads refresh on demand only");
        return pending().await;
    }

    info!(period_secs = scheduler.period_secs, "starting scheduler");
    let sync = &sync;
    Scheduler::new(scheduler.period())
        .run(|| async move { sync.fetch_and_refresh().await.map(|_| ()) })
        .await
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    // Kubernetes sends SIGTERM before SIGKILL during pod termination.
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("SIGINT (Ctrl+C) received, shutting down");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down");
        }
    }

    Ok(())
}

fn log_config(config: &ServerConfig) {
    debug!(
        host = config.application.host,
        port = config.application.port,
        kubeconfig = ?config.kubeconfig,
        sentry_enabled = config.sentry.is_some(),
        "server config"
    );
    log_catalog_config(&config.catalog);
    log_refresher_config(&config.refresher);
    log_webhook_config(&config.webhook);
    debug!(
        enabled = config.scheduler.enabled,
        period_secs = config.scheduler.period_secs,
        "scheduler config"
    );
}

fn log_catalog_config(config: &CatalogConfig) {
    debug!(
        base_url = config.base_url,
        api_version = config.api_version,
        request_timeout_secs = config.request_timeout_secs,
        domains = ?config.domains.keys().collect::<Vec<_>>(),
        "catalog config"
    );
}

fn log_refresher_config(config: &RefresherConfig) {
    debug!(
        annotation_prefix = config.annotation_prefix,
        label_selector = config.label_selector,
        namespaces = ?config.namespaces,
        kinds = ?config.kinds,
        max_attempts = config.retry.max_attempts,
        "refresher config"
    );
}

fn log_webhook_config(config: &WebhookConfig) {
    debug!(
        enabled = config.enabled,
        host = config.host,
        port = config.port,
        tls_cert_file = ?config.tls_cert_file,
        "webhook config"
    );
}
