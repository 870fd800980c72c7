use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, web};
use tracing_actix_web::TracingLogger;
use transync::admission::AdmissionInterceptor;

use crate::routes::health_check::health_check;
use crate::routes::refresh::refresh;
use crate::routes::webhook::{WEBHOOK_PATHS, review};
use crate::sync::SyncContext;

/// Largest admission review accepted, matching the api server's request limit.
const MAX_REVIEW_SIZE: usize = 3 * 1024 * 1024;

/// Starts the health and refresh trigger api on `listener`.
pub fn run_api(listener: TcpListener, sync: Arc<SyncContext>) -> Result<Server, std::io::Error> {
    let sync = web::Data::from(sync);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .service(health_check)
            .service(refresh)
            .app_data(sync.clone())
    })
    .disable_signals()
    .listen(listener)?
    .run();

    Ok(server)
}

/// Starts the admission webhook on `listener`, over TLS when `tls` is set.
pub fn run_webhook(
    listener: TcpListener,
    interceptor: AdmissionInterceptor,
    tls: Option<rustls::ServerConfig>,
) -> Result<Server, std::io::Error> {
    let interceptor = web::Data::new(interceptor);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().limit(MAX_REVIEW_SIZE))
            .app_data(interceptor.clone())
            .service(health_check)
            .service(web::resource(WEBHOOK_PATHS).route(web::post().to(review)))
    })
    .disable_signals();

    let server = match tls {
        Some(tls) => server.listen_rustls_0_23(listener, tls)?,
        None => server.listen(listener)?,
    };

    Ok(server.run())
}
