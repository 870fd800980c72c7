use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`refresher.namespaces` must contain at least one namespace")]
    NoNamespaces,

    #[error("`refresher.kinds` must contain at least one workload kind")]
    NoWorkloadKinds,

    #[error("`refresher.annotation_prefix` cannot be empty")]
    EmptyAnnotationPrefix,

    #[error("`refresher.label_selector` cannot be empty")]
    EmptyLabelSelector,

    #[error("`refresher.retry.max_attempts` cannot be zero")]
    RetryMaxAttemptsZero,

    #[error("`scheduler.period_secs` cannot be zero")]
    SchedulerPeriodZero,

    #[error("Invalid webhook config: `{0}` must be set when the webhook is enabled")]
    MissingWebhookTls(&'static str),

    #[error("The api key of catalog domain `{0}` is empty")]
    EmptyApiKey(String),
}
