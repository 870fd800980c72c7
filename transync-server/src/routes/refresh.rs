use actix_web::{
    HttpResponse, Responder, ResponseError,
    http::StatusCode,
    post,
    web::Data,
};
use thiserror::Error;

use crate::routes::ErrorMessage;
use crate::sync::SyncContext;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("The catalog fingerprints could not be fetched: {0}")]
    Fetch(String),
}

impl ResponseError for RefreshError {
    fn status_code(&self) -> StatusCode {
        match self {
            RefreshError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

/// Fetches the fingerprints and refreshes every workload before answering.
///
/// A fetch failure is answered with an error and stops the service, the same
/// way it does when the scheduler runs into it.
#[post("/refresh")]
pub async fn refresh(sync: Data<SyncContext>) -> Result<impl Responder, RefreshError> {
    let summary = match sync.fetch_and_refresh().await {
        Ok(summary) => summary,
        Err(err) => {
            let message = err.to_string();
            sync.report_fatal(err);

            return Err(RefreshError::Fetch(message));
        }
    };

    Ok(HttpResponse::Accepted().json(summary))
}
