mod config;
mod runner;
mod telemetry;

use config::ServiceConfig;
use relay_amqp::{create_reading_processor, AmqpClient, AmqpConsumer};
use relay_domain::{DeliveryService, ReadingService, RetryPolicy};
use relay_ingest::IngestClient;
use runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = telemetry::init_telemetry(&config.log_level) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        queue = %config.amqp_queue,
        backend = %config.backend_api_url,
        retry_attempts = config.retry_attempts,
        "starting weather relay worker"
    );
    debug!("configuration: {:?}", config);

    // A broker connection is the one thing the worker cannot run without
    let amqp_client = match AmqpClient::connect(
        &config.amqp_url,
        config.amqp_connect_attempts,
        Duration::from_secs(config.amqp_connect_delay_secs),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("failed to connect to rabbitmq: {:#}", e);
            std::process::exit(1);
        }
    };

    let channel = match amqp_client.consumer_channel(&config.amqp_queue).await {
        Ok(channel) => channel,
        Err(e) => {
            error!("failed to set up consumer channel: {:#}", e);
            std::process::exit(1);
        }
    };

    let ingest_client = match IngestClient::new(
        &config.backend_api_url,
        Duration::from_secs(config.http_timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to build ingest client: {:#}", e);
            std::process::exit(1);
        }
    };

    let policy = RetryPolicy {
        attempts: config.retry_attempts,
        delay: Duration::from_secs(config.retry_delay_secs),
    };
    let delivery = DeliveryService::new(Arc::new(ingest_client), policy);
    let reading_service = Arc::new(ReadingService::new(delivery));

    let processor = create_reading_processor(reading_service);
    let consumer = AmqpConsumer::new(channel, config.amqp_queue.clone(), "weather-relay", processor);

    Runner::new()
        .with_app_process(move |ctx| async move { consumer.run(ctx).await })
        .with_closer(move || async move { amqp_client.close().await })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}
