use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};
use transync::fingerprint::{FingerprintError, FingerprintSource};
use transync::refresher::{RefreshSummary, Refresher};

/// Runs reconciliation passes on behalf of the scheduler and the refresh
/// endpoint.
///
/// Fetch failures leave the shared fingerprints unusable; callers that cannot
/// return them to `main` report them with [`SyncContext::report_fatal`] so the
/// process stops.
pub struct SyncContext {
    source: Arc<FingerprintSource>,
    refresher: Arc<Refresher>,
    fatal_tx: mpsc::UnboundedSender<FingerprintError>,
}

impl SyncContext {
    pub fn new(
        source: Arc<FingerprintSource>,
        refresher: Arc<Refresher>,
    ) -> (Self, mpsc::UnboundedReceiver<FingerprintError>) {
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        let context = Self {
            source,
            refresher,
            fatal_tx,
        };

        (context, fatal_rx)
    }

    /// Fetches the fingerprints, then reconciles every workload against them.
    pub async fn fetch_and_refresh(&self) -> Result<RefreshSummary, FingerprintError> {
        let fingerprints = self.source.fetch().await?;
        let desired = fingerprints.snapshot().await;

        Ok(self.refresher.refresh(&desired).await)
    }

    /// Reconciles every workload against the last fetched fingerprints.
    pub async fn refresh(&self) -> RefreshSummary {
        let desired = self.source.fingerprints().snapshot().await;
        info!(domains = desired.len(), "refreshing workloads with the current fingerprints");

        self.refresher.refresh(&desired).await
    }

    /// Hands a fetch failure over to the main task, which stops the service.
    pub fn report_fatal(&self, err: FingerprintError) {
        if let Err(mpsc::error::SendError(err)) = self.fatal_tx.send(err) {
            error!(error = %err, "fatal error reported after shutdown");
        }
    }
}
