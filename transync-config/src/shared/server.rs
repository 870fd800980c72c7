use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::Config;
use crate::shared::{CatalogConfig, RefresherConfig, SentryConfig, ValidationError};

/// Complete configuration of the translation sync server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener of the health and refresh trigger endpoints.
    pub application: ApplicationSettings,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub refresher: RefresherConfig,
    /// Path to a kubeconfig file. The in-cluster configuration is used when
    /// unset or when the file does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

impl Config for ServerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["refresher.namespaces", "refresher.kinds"];
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.webhook.validate()?;
        self.scheduler.validate()?;
        self.catalog.validate()?;
        self.refresher.validate()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Mutating admission webhook listener, served over TLS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_webhook_host")]
    pub host: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
    /// PEM encoded certificate chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_file: Option<String>,
    /// PEM encoded private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_private_key_file: Option<String>,
}

impl WebhookConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.tls_cert_file.is_none() {
            return Err(ValidationError::MissingWebhookTls("webhook.tls_cert_file"));
        }
        if self.tls_private_key_file.is_none() {
            return Err(ValidationError::MissingWebhookTls(
                "webhook.tls_private_key_file",
            ));
        }

        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_webhook_host(),
            port: default_webhook_port(),
            tls_cert_file: None,
            tls_private_key_file: None,
        }
    }
}

fn default_webhook_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_webhook_port() -> u16 {
    8443
}

/// Periodic fetch and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

impl SchedulerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.period_secs == 0 {
            return Err(ValidationError::SchedulerPeriodZero);
        }

        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            period_secs: default_period_secs(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_period_secs() -> u64 {
    120
}
