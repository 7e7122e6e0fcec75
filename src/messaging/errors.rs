//! # Messaging Error Types
//!
//! The per-message error taxonomy the retry policy is built on. Every error
//! the processor can surface is either *permanent* (redelivery cannot
//! succeed: the subject or payload itself is at fault) or *transient*
//! (broker hiccups that a redelivery may heal). [`ProcessingError::is_permanent`]
//! is the single classifier; the acknowledgment decision in the processor
//! follows it directly.

use crate::messaging::publisher::PublishError;
use crate::translator::TranslationError;
use thiserror::Error;

/// Low-level failures reading or acknowledging an inbound message.
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Unable to read delivery metadata: {message}")]
    Metadata { message: String },

    #[error("Acknowledgment failed: {message}")]
    Acknowledgment { message: String },
}

impl MessagingError {
    /// Create a metadata extraction error
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    /// Create an acknowledgment error
    pub fn acknowledgment(message: impl Into<String>) -> Self {
        Self::Acknowledgment {
            message: message.into(),
        }
    }
}

/// Everything that can go wrong while processing one inbound message.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("unable to determine type of message as subject has too few parts: {subject}")]
    MalformedSubject { subject: String },

    #[error("no translator found for subject: {routing_key}")]
    UnknownRoutingKey { routing_key: String },

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Unable to read delivery metadata: {message}")]
    Metadata { message: String },

    #[error("Acknowledgment failed: {message}")]
    Acknowledgment { message: String },
}

impl ProcessingError {
    /// Create a malformed subject error
    pub fn malformed_subject(subject: impl Into<String>) -> Self {
        Self::MalformedSubject {
            subject: subject.into(),
        }
    }

    /// Create an unknown routing key error
    pub fn unknown_routing_key(routing_key: impl Into<String>) -> Self {
        Self::UnknownRoutingKey {
            routing_key: routing_key.into(),
        }
    }

    /// Whether redelivering the message could possibly change the outcome.
    ///
    /// Permanent errors are acknowledged so the broker removes the message;
    /// transient errors withhold acknowledgment so the broker redelivers
    /// after the visibility window.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::MalformedSubject { .. } | Self::UnknownRoutingKey { .. } | Self::Translation(_)
        )
    }
}

impl From<MessagingError> for ProcessingError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::Metadata { message } => Self::Metadata { message },
            MessagingError::Acknowledgment { message } => Self::Acknowledgment { message },
        }
    }
}
