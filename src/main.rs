//! Process bootstrap: configuration, logging, broker provisioning, the
//! delivery/worker tasks, the HTTP ingress, and signal-driven shutdown.

use async_nats::jetstream;
use async_nats::jetstream::consumer::pull;
use async_nats::jetstream::consumer::AckPolicy;
use async_nats::jetstream::stream::RetentionPolicy;
use cdevents_adapter::config::AdapterConfig;
use cdevents_adapter::error::AdapterError;
use cdevents_adapter::logging::init_logging;
use cdevents_adapter::messaging::{
    JetStreamEventPublisher, MessageProcessor, WebhookWorker, DEFAULT_CHANNEL_CAPACITY,
};
use cdevents_adapter::translator::TranslatorRegistry;
use cdevents_adapter::web::{self, AppState};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const HTTP_GRACE_PERIOD: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdapterConfig::from_env()?;
    init_logging(&config.log_level);

    info!(nats_url = %config.nats_url, "Connecting to NATS...");
    let client = async_nats::connect(&config.nats_url)
        .await
        .map_err(|e| AdapterError::broker_connection(e.to_string()))?;
    let jetstream = jetstream::new(client.clone());

    let consumer = tokio::time::timeout(STARTUP_TIMEOUT, provision(&jetstream, &config))
        .await
        .map_err(|_| AdapterError::broker_connection("timed out provisioning streams"))??;

    let registry = Arc::new(TranslatorRegistry::with_default_translators());
    info!(
        translators = ?registry.routing_keys(),
        "Translator registry ready"
    );

    let publisher = Arc::new(JetStreamEventPublisher::new(jetstream.clone()));
    let processor = MessageProcessor::new(registry, publisher);

    let (delivery_tx, delivery_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Delivery task: pulls from the durable consumer into the bounded
    // channel. Stopped first on shutdown so no new messages reach the
    // worker; dropping the sender then lets the worker drain and stop.
    let mut delivery_shutdown = shutdown_rx.clone();
    let delivery_handle = tokio::spawn(async move {
        let mut messages = match consumer.messages().await {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "Failed to start consuming webhook messages");
                return;
            }
        };
        loop {
            tokio::select! {
                maybe_message = messages.next() => match maybe_message {
                    Some(Ok(message)) => {
                        if delivery_tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Error receiving message from consumer");
                    }
                    None => {
                        warn!("Consumer message stream ended");
                        break;
                    }
                },
                changed = delivery_shutdown.changed() => {
                    if changed.is_err() || *delivery_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    let worker = WebhookWorker::new(processor, delivery_rx, shutdown_rx.clone());
    let worker_handle = tokio::spawn(worker.run());

    info!("Starting server...");
    let state = AppState::new(client, jetstream, config.webhook_subject_base.clone());
    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .map_err(|e| AdapterError::http_server(e.to_string()))?;
    info!(port = config.http_port, "Server listening...");

    let signal_shutdown = shutdown_tx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        wait_for_shutdown_signal().await;
        info!("Received interrupt signal");
        // Stop delivery before the listener so nothing new enters the
        // pipeline while HTTP drains.
        let _ = signal_shutdown.send(true);
    });

    let mut grace = shutdown_rx.clone();
    tokio::select! {
        result = server => {
            result.map_err(|e| AdapterError::http_server(e.to_string()))?;
        }
        _ = async {
            while !*grace.borrow() {
                if grace.changed().await.is_err() {
                    return std::future::pending::<()>().await;
                }
            }
            tokio::time::sleep(HTTP_GRACE_PERIOD).await;
        } => {
            warn!("HTTP server did not drain within the grace period");
        }
    }

    info!("Gracefully shutting down...");
    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = worker_handle.await;
        let _ = delivery_handle.await;
    })
    .await;

    match drained {
        Ok(()) => {
            info!("All done, exit program");
            Ok(())
        }
        Err(_) => {
            error!("Timeout waiting for all tasks to finish");
            Err(AdapterError::ShutdownTimeout {
                timeout_seconds: SHUTDOWN_TIMEOUT.as_secs(),
            }
            .into())
        }
    }
}

/// Create or reuse the inbound and outbound streams and the durable
/// webhook consumer. All failures here are fatal for startup.
async fn provision(
    jetstream: &jetstream::Context,
    config: &AdapterConfig,
) -> anyhow::Result<jetstream::consumer::Consumer<pull::Config>> {
    let webhook_stream = jetstream
        .get_or_create_stream(jetstream::stream::Config {
            name: config.webhook_stream_name.clone(),
            description: Some("CDEvents adapter incoming webhook stream".to_string()),
            subjects: vec![config.webhook_subject_filter()],
            retention: RetentionPolicy::WorkQueue,
            ..Default::default()
        })
        .await
        .map_err(|e| {
            AdapterError::stream_provisioning(&config.webhook_stream_name, e.to_string())
        })?;
    info!(stream = %config.webhook_stream_name, "Webhook stream ready");

    jetstream
        .get_or_create_stream(jetstream::stream::Config {
            name: config.event_stream_name.clone(),
            description: Some("CDEvents adapter event output stream".to_string()),
            subjects: vec![config.event_subject_filter()],
            ..Default::default()
        })
        .await
        .map_err(|e| {
            AdapterError::stream_provisioning(&config.event_stream_name, e.to_string())
        })?;
    info!(stream = %config.event_stream_name, "Event stream ready");

    let consumer = webhook_stream
        .get_or_create_consumer(
            &config.webhook_consumer_name,
            pull::Config {
                durable_name: Some(config.webhook_consumer_name.clone()),
                ack_policy: AckPolicy::Explicit,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            AdapterError::consumer_provisioning(&config.webhook_consumer_name, e.to_string())
        })?;
    info!(consumer = %config.webhook_consumer_name, "Durable webhook consumer ready");

    Ok(consumer)
}

/// Resolve on SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
