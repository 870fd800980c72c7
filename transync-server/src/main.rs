use std::sync::Arc;

use tracing::{error, info};
use transync_config::Environment;
use transync_config::shared::ServerConfig;
use transync_server::config::load_server_config;
use transync_server::core::start_service_with_config;
use transync_telemetry::init_tracing;

fn main() -> anyhow::Result<()> {
    let server_config = load_server_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // Initialize Sentry before the async runtime starts
    let _sentry_guard = init_sentry(&server_config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(server_config))?;

    Ok(())
}

async fn async_main(server_config: ServerConfig) -> anyhow::Result<()> {
    if let Err(err) = start_service_with_config(server_config).await {
        sentry::integrations::anyhow::capture_anyhow(&err);
        error!("an error occurred in the transync service: {err:#}");

        return Err(err);
    }

    Ok(())
}

/// Initializes Sentry when a DSN is configured.
///
/// Tags every event with the service name and captures panics.
fn init_sentry(config: &ServerConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(sentry_config) = &config.sentry else {
        info!("sentry not configured, skipping initialization");
        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(sentry_config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "transync");
    });

    Ok(Some(guard))
}
