#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CDEvents Adapter
//!
//! Bridges a Gitea webhook source and NATS JetStream, normalizing
//! heterogeneous webhook payloads into the CDEvents canonical schema and
//! forwarding them with at-least-once delivery.
//!
//! ## Architecture
//!
//! Raw webhook bodies arrive over HTTP and are appended, unmodified, to a
//! durable work-queue stream. A single worker drains that stream one message
//! at a time: it derives a routing key from the message subject, looks up
//! the matching translator in an immutable registry, translates the payload
//! into exactly one canonical event, publishes it to the outbound event
//! stream as a CloudEvents envelope, and only then acknowledges the inbound
//! message. Transient publish failures withhold acknowledgment so the broker
//! redelivers; permanent failures (bad subject, unknown kind, bad payload)
//! are logged and removed from the queue.
//!
//! Adding a new payload kind means one translator implementation and one
//! registry entry — the pipeline itself never changes.
//!
//! ## Module Organization
//!
//! - [`events`] - Canonical CDEvents model and validating builder
//! - [`translator`] - Translator capability, registry, and Gitea translators
//! - [`messaging`] - Message processor, publisher, and worker
//! - [`web`] - HTTP ingress and health endpoints
//! - [`config`] - Environment-driven configuration
//! - [`logging`] - Structured JSON logging setup
//! - [`error`] - Startup error handling

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod translator;
pub mod web;

pub use config::AdapterConfig;
pub use error::{AdapterError, Result};
pub use events::{CdEvent, CdEventType};
pub use messaging::{
    EventPublisher, JetStreamEventPublisher, MessageProcessor, ProcessingError, WebhookWorker,
};
pub use translator::{CdEventTranslator, TranslationError, TranslatorRegistry};
