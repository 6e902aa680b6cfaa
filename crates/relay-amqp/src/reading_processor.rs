use crate::consumer::{MessageProcessor, Verdict};
use relay_domain::{DomainError, ReadingService};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create a [`MessageProcessor`] that runs message bodies through the domain
/// service and reduces the result to an acknowledgment verdict.
///
/// Every failure maps to `Requeue`. That means a permanently malformed
/// message is redelivered indefinitely unless the broker dead-letters it;
/// this mirrors the upstream producer contract and is a known limitation.
pub fn create_reading_processor(service: Arc<ReadingService>) -> MessageProcessor {
    Box::new(move |body: Vec<u8>| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            match service.process(&body).await {
                Ok(()) => {
                    debug!("message processed successfully");
                    Verdict::Ack
                }
                Err(e @ DomainError::Decode(_)) => {
                    error!(error = %e, "failed to decode message body");
                    Verdict::Requeue
                }
                Err(e @ DomainError::Validation(_)) => {
                    warn!(error = %e, "reading failed validation");
                    Verdict::Requeue
                }
                Err(e) => {
                    warn!(error = %e, "delivery failed, requeueing");
                    Verdict::Requeue
                }
            }
        })
    })
}
