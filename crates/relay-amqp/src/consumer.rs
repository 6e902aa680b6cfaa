use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions};
use lapin::types::FieldTable;
use lapin::Channel;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Verdict a processor hands back for one message.
///
/// This binary signal is the only thing that crosses from processing into
/// the consumption loop; error details stay inside the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Processing succeeded: acknowledge, permanently removing the message.
    Ack,
    /// Processing failed: negatively acknowledge and requeue for redelivery.
    Requeue,
}

/// Type alias for the message processor function.
/// Takes one raw message body and returns the acknowledgment verdict.
/// The processor is responsible for decoding and business logic.
pub type MessageProcessor = Box<dyn Fn(Vec<u8>) -> BoxFuture<'static, Verdict> + Send + Sync>;

/// Single-message consumption loop over a manually-acked queue.
///
/// One message is in flight at a time (the channel carries prefetch 1); the
/// loop blocks on the processor before touching the broker again, so
/// deliveries reach the downstream API in receipt order.
pub struct AmqpConsumer {
    channel: Channel,
    queue: String,
    consumer_tag: String,
    processor: MessageProcessor,
}

impl AmqpConsumer {
    pub fn new(
        channel: Channel,
        queue: impl Into<String>,
        consumer_tag: impl Into<String>,
        processor: MessageProcessor,
    ) -> Self {
        Self {
            channel,
            queue: queue.into(),
            consumer_tag: consumer_tag.into(),
            processor,
        }
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .context("failed to start consuming")?;

        info!(queue = %self.queue, "listening for messages");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("received shutdown signal, stopping consumer");
                    break;
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => self.handle_delivery(delivery).await,
                        Some(Err(e)) => {
                            error!(error = %e, "error receiving delivery");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                        None => {
                            // Channel is gone; exit instead of idling in a
                            // broken consumption state.
                            bail!("consume stream closed by broker");
                        }
                    }
                }
            }
        }

        info!("consumer stopped gracefully");
        Ok(())
    }

    async fn handle_delivery(&self, mut delivery: Delivery) {
        let body = std::mem::take(&mut delivery.data);
        debug!(bytes = body.len(), redelivered = delivery.redelivered, "received message");

        match (self.processor)(body).await {
            Verdict::Ack => {
                if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                    error!(error = %e, "failed to acknowledge message");
                } else {
                    debug!("message acknowledged");
                }
            }
            Verdict::Requeue => {
                let options = BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                };
                if let Err(e) = delivery.nack(options).await {
                    error!(error = %e, "failed to requeue message");
                } else {
                    warn!("message requeued for redelivery");
                }
            }
        }
    }
}

// Unit tests for the loop itself would need a live broker to construct
// Delivery values; the verdict mapping is covered in reading_processor.rs and
// end-to-end behavior belongs to integration tests against real RabbitMQ.
