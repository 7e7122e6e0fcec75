//! # Inbound Message Abstraction
//!
//! The processor owns one inbound message for the duration of a processing
//! attempt and needs exactly four things from it: the routing subject, the
//! payload bytes, delivery metadata for observability, and explicit
//! acknowledgment. [`InboundMessage`] is that seam, with the production
//! implementation over [`async_nats::jetstream::Message`] and test doubles
//! in the processor tests.

use crate::messaging::errors::MessagingError;
use async_trait::async_trait;

/// Broker delivery metadata for one message, extracted up front for
/// structured logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryMetadata {
    /// Stream the message was read from
    pub stream: String,
    /// Durable consumer that received it
    pub consumer: String,
    /// Position in the stream
    pub stream_sequence: u64,
    /// Position for this consumer
    pub consumer_sequence: u64,
    /// How many times the broker has delivered this message (1 = first)
    pub delivered: i64,
}

/// One durably-queued inbound message.
#[async_trait]
pub trait InboundMessage: Send + Sync {
    /// Hierarchical dot-separated routing subject.
    fn subject(&self) -> &str;

    /// Raw webhook payload, unmodified since ingress.
    fn payload(&self) -> &[u8];

    /// Delivery metadata; failure here is transient (the broker reply
    /// subject was unreadable, a redelivery carries a fresh one).
    fn delivery_metadata(&self) -> Result<DeliveryMetadata, MessagingError>;

    /// Explicitly acknowledge consumption, removing the message from the
    /// work queue.
    async fn ack(&self) -> Result<(), MessagingError>;
}

#[async_trait]
impl InboundMessage for async_nats::jetstream::Message {
    fn subject(&self) -> &str {
        self.message.subject.as_str()
    }

    fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    fn delivery_metadata(&self) -> Result<DeliveryMetadata, MessagingError> {
        let info = self
            .info()
            .map_err(|e| MessagingError::metadata(e.to_string()))?;
        Ok(DeliveryMetadata {
            stream: info.stream.to_string(),
            consumer: info.consumer.to_string(),
            stream_sequence: info.stream_sequence,
            consumer_sequence: info.consumer_sequence,
            delivered: info.delivered,
        })
    }

    async fn ack(&self) -> Result<(), MessagingError> {
        async_nats::jetstream::Message::ack(self)
            .await
            .map_err(|e| MessagingError::acknowledgment(e.to_string()))
    }
}
