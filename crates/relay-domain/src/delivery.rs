use crate::reading::WeatherReading;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded fixed-delay retry budget for downstream delivery.
///
/// `attempts` counts the first try. The delay runs only between failed
/// attempts, never after the last one. No backoff, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Final classification of one delivery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The ingestion API answered with a 2xx status.
    Delivered,
    /// Every attempt reached the server but the last answer was non-2xx.
    RejectedByServer { status: u16 },
    /// The last attempt failed before an HTTP response existed.
    TransportFailure,
}

/// One POST attempt against the downstream ingestion API.
/// Infrastructure layer (relay-ingest) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IngestEndpoint: Send + Sync {
    /// Issue a single HTTP POST for the reading; returns the response status
    /// code, or an error if the transport call itself failed.
    async fn send(&self, reading: &WeatherReading) -> anyhow::Result<u16>;
}

/// Applies the retry policy around an [`IngestEndpoint`].
///
/// Holds no mutable state; each `deliver` call is shaped only by the policy
/// and the reading it is given.
pub struct DeliveryService {
    endpoint: Arc<dyn IngestEndpoint>,
    policy: RetryPolicy,
}

impl DeliveryService {
    pub fn new(endpoint: Arc<dyn IngestEndpoint>, policy: RetryPolicy) -> Self {
        Self { endpoint, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Deliver one reading, retrying up to the policy budget.
    ///
    /// A 2xx response short-circuits to `Delivered`; otherwise the kind of
    /// the final failed attempt decides the outcome.
    pub async fn deliver(&self, reading: &WeatherReading) -> DeliveryOutcome {
        let attempts = self.policy.attempts.max(1);
        let mut outcome = DeliveryOutcome::TransportFailure;

        for attempt in 1..=attempts {
            debug!(
                attempt,
                total = attempts,
                location = %reading.location,
                "sending reading to ingestion api"
            );

            match self.endpoint.send(reading).await {
                Ok(status) if (200..300).contains(&status) => {
                    info!(status, attempt, "reading delivered");
                    return DeliveryOutcome::Delivered;
                }
                Ok(status) => {
                    warn!(
                        status,
                        attempt,
                        total = attempts,
                        "ingestion api rejected reading"
                    );
                    outcome = DeliveryOutcome::RejectedByServer { status };
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        total = attempts,
                        "transport error sending reading"
                    );
                    outcome = DeliveryOutcome::TransportFailure;
                }
            }

            if attempt < attempts {
                debug!(delay = ?self.policy.delay, "waiting before next attempt");
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        warn!(attempts, "delivery attempts exhausted");
        outcome
    }
}
