use anyhow::{anyhow, Context, Result};
use lapin::options::{BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use std::time::Duration;
use tracing::{info, warn};

pub struct AmqpClient {
    connection: Connection,
}

impl AmqpClient {
    /// Connect to the broker with a bounded retry budget.
    ///
    /// The broker is commonly still starting when this worker comes up, so a
    /// handful of spaced attempts is made before giving up for good.
    pub async fn connect(url: &str, attempts: u32, delay: Duration) -> Result<Self> {
        let mut last_err = None;

        for attempt in 1..=attempts {
            info!(attempt, total = attempts, "connecting to rabbitmq");
            match Connection::connect(url, ConnectionProperties::default()).await {
                Ok(connection) => {
                    info!("connected to rabbitmq");
                    return Ok(Self { connection });
                }
                Err(e) => {
                    warn!(error = %e, attempt, total = attempts, "rabbitmq connection failed");
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let err = last_err
            .map(anyhow::Error::new)
            .unwrap_or_else(|| anyhow!("connection attempt budget was zero"));
        Err(err.context("failed to connect to rabbitmq"))
    }

    /// Open a channel bound to a durable queue, with manual acknowledgment
    /// and a prefetch of one unacked message at a time.
    ///
    /// Prefetch 1 is what keeps processing strictly ordered: the broker will
    /// not hand over the next message until the current one is acked or
    /// requeued.
    pub async fn consumer_channel(&self, queue: &str) -> Result<Channel> {
        let channel = self
            .connection
            .create_channel()
            .await
            .context("failed to open channel")?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .context("failed to declare queue")?;

        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .context("failed to set prefetch count")?;

        info!(queue, "queue declared with prefetch 1");
        Ok(channel)
    }

    pub async fn close(self) -> Result<()> {
        info!("closing rabbitmq connection");
        self.connection
            .close(200, "shutdown")
            .await
            .context("failed to close rabbitmq connection")?;
        Ok(())
    }
}
