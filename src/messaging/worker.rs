//! # Webhook Worker
//!
//! A single dedicated task drains a bounded channel of inbound messages and
//! runs the processor on them strictly one at a time. The broker delivery
//! task feeds the channel asynchronously, decoupling network I/O from
//! processing; the bounded buffer absorbs delivery bursts and provides
//! backpressure.
//!
//! Per-message errors are logged and never escape the loop. The worker stops
//! when the shutdown signal flips or the delivery side closes the channel,
//! finishing its current message first.

use crate::messaging::message::InboundMessage;
use crate::messaging::processor::MessageProcessor;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Default depth of the delivery channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Single-consumer worker over the delivery channel.
pub struct WebhookWorker<M: InboundMessage> {
    processor: MessageProcessor,
    receiver: mpsc::Receiver<M>,
    shutdown: watch::Receiver<bool>,
}

impl<M: InboundMessage> WebhookWorker<M> {
    pub fn new(
        processor: MessageProcessor,
        receiver: mpsc::Receiver<M>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            processor,
            receiver,
            shutdown,
        }
    }

    /// Drain the channel until shutdown is signalled or the delivery side
    /// closes.
    pub async fn run(mut self) {
        info!("JetStream consumer ready and listening...");

        loop {
            tokio::select! {
                maybe_message = self.receiver.recv() => match maybe_message {
                    Some(message) => {
                        if let Err(e) = self.processor.process(&message).await {
                            error!(
                                error = %e,
                                permanent = e.is_permanent(),
                                "Error when processing message"
                            );
                        }
                    }
                    None => {
                        info!("Delivery channel closed, stopping worker");
                        break;
                    }
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Stopped processing messages");
                        break;
                    }
                }
            }
        }
    }
}
