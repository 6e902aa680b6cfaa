use crate::delivery::{DeliveryOutcome, DeliveryService};
use crate::error::{DomainError, DomainResult};
use crate::reading::WeatherReading;
use crate::validate::validate_reading;
use tracing::{debug, instrument};

/// Domain service that turns one raw queue message into one delivery.
///
/// Flow:
/// 1. Decode the body as a JSON [`WeatherReading`]
/// 2. Validate shape and value ranges
/// 3. Deliver to the ingestion API under the retry policy
///
/// Decode and validation failures are permanent for the given body; only the
/// delivery step involves I/O.
pub struct ReadingService {
    delivery: DeliveryService,
}

impl ReadingService {
    pub fn new(delivery: DeliveryService) -> Self {
        Self { delivery }
    }

    /// Process one message body end to end.
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn process(&self, body: &[u8]) -> DomainResult<()> {
        let reading: WeatherReading = serde_json::from_slice(body)?;
        validate_reading(&reading)?;

        debug!(
            location = %reading.location,
            temperature = reading.temperature,
            humidity = reading.humidity,
            "reading validated"
        );

        let attempts = self.delivery.policy().attempts;
        match self.delivery.deliver(&reading).await {
            DeliveryOutcome::Delivered => Ok(()),
            DeliveryOutcome::RejectedByServer { status } => {
                Err(DomainError::DeliveryRejected { status, attempts })
            }
            DeliveryOutcome::TransportFailure => Err(DomainError::Transport { attempts }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{MockIngestEndpoint, RetryPolicy};
    use std::sync::Arc;
    use std::time::Duration;

    fn service(mock: MockIngestEndpoint, attempts: u32) -> ReadingService {
        let policy = RetryPolicy {
            attempts,
            delay: Duration::from_secs(5),
        };
        ReadingService::new(DeliveryService::new(Arc::new(mock), policy))
    }

    const VALID_BODY: &str = r#"{
        "location": "Pindamonhangaba, BR",
        "temperature": 22.5,
        "humidity": 55.0,
        "windSpeed": 4.0,
        "condition": "Clear Sky",
        "timestamp": "2024-06-01T12:00:00"
    }"#;

    #[tokio::test]
    async fn test_malformed_body_never_reaches_endpoint() {
        // No expectations: any call on the mock fails the test
        let mock = MockIngestEndpoint::new();
        let service = service(mock, 3);

        let result = service.process(b"not json at all").await;

        assert!(matches!(result, Err(DomainError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_location_never_reaches_endpoint() {
        let mock = MockIngestEndpoint::new();
        let service = service(mock, 3);

        let body = r#"{"location":"","temperature":20,"humidity":50,"windSpeed":3,"condition":"clear","timestamp":"t"}"#;
        let result = service.process(body.as_bytes()).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_temperature_never_reaches_endpoint() {
        let mock = MockIngestEndpoint::new();
        let service = service(mock, 3);

        let body = r#"{"location":"Sao Paulo","temperature":150,"humidity":50,"windSpeed":3,"condition":"clear","timestamp":"t"}"#;
        let result = service.process(body.as_bytes()).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_valid_reading_delivered_on_first_attempt() {
        let mut mock = MockIngestEndpoint::new();
        mock.expect_send()
            .withf(|r: &WeatherReading| r.location == "Pindamonhangaba, BR")
            .times(1)
            .returning(|_| Ok(200));
        let service = service(mock, 3);

        let result = service.process(VALID_BODY.as_bytes()).await;

        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_server_rejection_exhausts_budget() {
        let mut mock = MockIngestEndpoint::new();
        mock.expect_send().times(3).returning(|_| Ok(500));
        let service = service(mock, 3);

        let result = service.process(VALID_BODY.as_bytes()).await;

        assert!(matches!(
            result,
            Err(DomainError::DeliveryRejected {
                status: 500,
                attempts: 3
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_transport_failure_exhausts_budget() {
        let mut mock = MockIngestEndpoint::new();
        mock.expect_send()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("dns failure")));
        let service = service(mock, 3);

        let result = service.process(VALID_BODY.as_bytes()).await;

        assert!(matches!(
            result,
            Err(DomainError::Transport { attempts: 3 })
        ));
    }
}
