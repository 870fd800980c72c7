use actix_web::{
    HttpResponse, Responder, ResponseError,
    http::StatusCode,
    web::{Data, Json},
};
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionReview, ConvertAdmissionReviewError};
use thiserror::Error;
use transync::admission::AdmissionInterceptor;

use crate::routes::ErrorMessage;

/// Paths the admission webhook is registered under, one per workload kind.
pub const WEBHOOK_PATHS: [&str; 3] = ["/daemonsets", "/deployments", "/statefulsets"];

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("The admission review is invalid: {0}")]
    InvalidReview(#[from] ConvertAdmissionReviewError),
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidReview(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

/// Answers an admission review with the fingerprint patch of its object.
pub async fn review(
    interceptor: Data<AdmissionInterceptor>,
    review: Json<AdmissionReview<DynamicObject>>,
) -> Result<impl Responder, WebhookError> {
    let request: AdmissionRequest<DynamicObject> = review.into_inner().try_into()?;
    let response = interceptor.admit(&request).await;

    Ok(HttpResponse::Ok().json(response.into_review()))
}
