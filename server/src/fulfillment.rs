//! Asynchronous redemption fulfillment.
//!
//! Redemption requests enqueue a job here; the worker waits out the
//! configured delay and then re-enters the engine through the service lock
//! to allocate a gift-card code. The delay models gift-card provisioning
//! latency and is a policy parameter, not a correctness requirement.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::Service;

pub struct FulfillmentJob {
    pub redemption_id: String,
}

/// Drains the job queue for the lifetime of the service. Each job gets its
/// own delayed task so a slow settlement never holds back the next one;
/// duplicate jobs for one record are harmless (the engine no-ops on
/// anything already settled).
pub(crate) fn spawn(
    service: Arc<Service>,
    mut jobs: mpsc::UnboundedReceiver<FulfillmentJob>,
    delay: Duration,
) {
    tokio::spawn(async move {
        while let Some(job) = jobs.recv().await {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                debug!(redemption_id = %job.redemption_id, delay_ms = delay.as_millis() as u64, "fulfillment scheduled");
                tokio::time::sleep(delay).await;
                service.fulfill_now(&job.redemption_id).await;
            });
        }
    });
}
