//! # Message Processor
//!
//! The core orchestration state machine. One call to
//! [`MessageProcessor::process`] takes one durably-queued inbound message
//! through metadata extraction, routing, translation, and publish, then
//! decides acknowledgment from the error classification:
//!
//! - success → acknowledge
//! - permanent failure (malformed subject, unknown routing key, translation
//!   failure) → acknowledge anyway, redelivering the same bytes cannot
//!   succeed
//! - transient failure (metadata extraction, publish) → withhold
//!   acknowledgment so the broker redelivers after the visibility window
//!
//! Routing is data-driven: the subject's first segment names the ingress
//! channel, the remainder is the routing key into the translator registry.
//! New payload kinds are added by registering a translator, never by
//! touching this module.

use crate::messaging::errors::ProcessingError;
use crate::messaging::message::{DeliveryMetadata, InboundMessage};
use crate::messaging::publisher::EventPublisher;
use crate::translator::TranslatorRegistry;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Per-message processing pipeline, shared by the worker task.
pub struct MessageProcessor {
    registry: Arc<TranslatorRegistry>,
    publisher: Arc<dyn EventPublisher>,
}

impl MessageProcessor {
    /// Create a processor over an immutable registry and a publisher.
    pub fn new(registry: Arc<TranslatorRegistry>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    /// Process one inbound message end to end and govern its acknowledgment.
    #[instrument(skip_all, fields(subject = %message.subject()))]
    pub async fn process(&self, message: &dyn InboundMessage) -> Result<(), ProcessingError> {
        let metadata = message.delivery_metadata()?;

        debug!(
            subject = message.subject(),
            stream = %metadata.stream,
            consumer = %metadata.consumer,
            stream_seq = metadata.stream_sequence,
            consumer_seq = metadata.consumer_sequence,
            num_delivered = metadata.delivered,
            "Processing incoming webhook message"
        );

        let outcome = self.run_pipeline(message, &metadata).await;

        match outcome {
            Ok(()) => {
                message.ack().await.map_err(ProcessingError::from)?;
                Ok(())
            }
            Err(err) if err.is_permanent() => {
                // Remove the message from the work queue: the same bytes
                // would fail again on redelivery.
                if let Err(ack_err) = message.ack().await {
                    warn!(
                        error = %ack_err,
                        subject = message.subject(),
                        "Failed to acknowledge permanently failed message"
                    );
                }
                Err(err)
            }
            Err(err) => {
                debug!(
                    subject = message.subject(),
                    num_delivered = metadata.delivered,
                    error = %err,
                    "Withholding acknowledgment for transient failure, broker will redeliver"
                );
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        message: &dyn InboundMessage,
        metadata: &DeliveryMetadata,
    ) -> Result<(), ProcessingError> {
        let subject = message.subject();

        let segments: Vec<&str> = subject.split('.').collect();
        if segments.len() < 2 {
            return Err(ProcessingError::malformed_subject(subject));
        }

        let routing_key = segments[1..].join(".");
        let translator = self
            .registry
            .lookup(&routing_key)
            .ok_or_else(|| ProcessingError::unknown_routing_key(routing_key.clone()))?;

        let event = translator.translate(message.payload())?;

        debug!(
            event_type = %event.context.event_type,
            subject = subject,
            routing_key = %routing_key,
            stream_seq = metadata.stream_sequence,
            num_delivered = metadata.delivered,
            "Translated incoming webhook message into a canonical event"
        );

        self.publisher.publish(&event).await?;

        Ok(())
    }
}
