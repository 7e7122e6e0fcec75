//! # Messaging Module
//!
//! Everything between the durable inbound queue and the durable outbound
//! stream: the inbound message seam, the per-message processor, the event
//! publisher, and the single-consumer worker that ties them together.

pub mod errors;
pub mod message;
pub mod processor;
pub mod publisher;
pub mod worker;

pub use errors::{MessagingError, ProcessingError};
pub use message::{DeliveryMetadata, InboundMessage};
pub use processor::MessageProcessor;
pub use publisher::{EventPublisher, JetStreamEventPublisher, PublishError};
pub use worker::{WebhookWorker, DEFAULT_CHANNEL_CAPACITY};
