//! # Event Publisher
//!
//! Converts a canonical event into its interoperable wire form — a
//! CloudEvents binary-mode envelope (attribute headers + JSON body) — and
//! delivers it to the outbound JetStream stream. The publish subject is the
//! event's own type string, so consumers can filter by event kind with plain
//! subject subscriptions.
//!
//! Each publish awaits the broker's ack under a bounded deadline; an attempt
//! that outlives the deadline is abandoned and reported as a
//! [`PublishError`], which the processor classifies as transient.

use crate::events::CdEvent;
use async_nats::jetstream;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Deadline applied to one publish attempt, broker ack included.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures delivering a canonical event to the outbound stream.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broker publish failed: {message}")]
    Transport { message: String },

    #[error("Publish timed out after {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },
}

impl PublishError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Delivers one canonical event to the outbound durable stream.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &CdEvent) -> Result<(), PublishError>;
}

/// JetStream-backed publisher emitting CloudEvents binary-mode envelopes.
///
/// The context is a cheap handle over the shared connection; nothing is held
/// across calls, so a future multi-worker deployment can clone this freely.
#[derive(Clone)]
pub struct JetStreamEventPublisher {
    jetstream: jetstream::Context,
    timeout: Duration,
}

impl JetStreamEventPublisher {
    /// Create a publisher with the default 10-second deadline.
    pub fn new(jetstream: jetstream::Context) -> Self {
        Self::with_timeout(jetstream, DEFAULT_PUBLISH_TIMEOUT)
    }

    /// Create a publisher with an explicit per-attempt deadline.
    pub fn with_timeout(jetstream: jetstream::Context, timeout: Duration) -> Self {
        Self { jetstream, timeout }
    }

    fn wire_headers(event: &CdEvent) -> async_nats::HeaderMap {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert("ce-specversion", "1.0");
        headers.insert("ce-id", event.context.id.as_str());
        headers.insert("ce-type", event.context.event_type.as_str());
        headers.insert("ce-source", event.context.source.as_str());
        headers.insert("ce-time", event.context.timestamp.to_rfc3339().as_str());
        headers.insert("content-type", "application/json");
        headers
    }
}

#[async_trait]
impl EventPublisher for JetStreamEventPublisher {
    async fn publish(&self, event: &CdEvent) -> Result<(), PublishError> {
        let body = serde_json::to_vec(event)?;
        let headers = Self::wire_headers(event);
        let subject = event.context.event_type.clone();

        let attempt = async {
            let ack_future = self
                .jetstream
                .publish_with_headers(subject.clone(), headers, body.into())
                .await
                .map_err(|e| PublishError::transport(e.to_string()))?;

            ack_future
                .await
                .map_err(|e| PublishError::transport(e.to_string()))?;

            Ok::<(), PublishError>(())
        };

        tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| PublishError::Timeout {
                timeout_seconds: self.timeout.as_secs(),
            })??;

        debug!(
            subject = %subject,
            event_id = %event.context.id,
            "Published canonical event"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CdEventType;

    fn sample_event() -> CdEvent {
        CdEvent::builder(CdEventType::ChangeMerged)
            .source("git.example.com")
            .subject_id("abc123")
            .subject_source("git.example.com/yoloco/project1")
            .repository_id("yoloco/project1")
            .build()
            .unwrap()
    }

    #[test]
    fn test_wire_headers_carry_cloudevents_attributes() {
        let event = sample_event();
        let headers = JetStreamEventPublisher::wire_headers(&event);

        assert_eq!(
            headers.get("ce-type").map(|v| v.as_str()),
            Some("dev.cdevents.change.merged.0.3.0")
        );
        assert_eq!(
            headers.get("ce-source").map(|v| v.as_str()),
            Some("git.example.com")
        );
        assert_eq!(
            headers.get("ce-specversion").map(|v| v.as_str()),
            Some("1.0")
        );
        assert_eq!(
            headers.get("content-type").map(|v| v.as_str()),
            Some("application/json")
        );
        assert!(headers.get("ce-id").is_some());
        assert!(headers.get("ce-time").is_some());
    }
}
