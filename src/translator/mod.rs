//! # Translator Capability
//!
//! A translator converts one payload kind's raw bytes into exactly one
//! canonical event. Adding support for a new payload kind means writing one
//! [`CdEventTranslator`] implementation and registering it under its routing
//! key in the [`TranslatorRegistry`] — the message processor never changes.
//!
//! Translation failures are permanent by definition: the payload bytes will
//! not improve on redelivery, so the processor removes the message from the
//! queue after logging.

pub mod gitea;
pub mod registry;

use crate::events::{CdEvent, ValidationError};
use thiserror::Error;
use url::Url;

pub use registry::TranslatorRegistry;

/// Failures while turning raw payload bytes into a canonical event.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Push event contains no new commits, will not convert to a CD Event")]
    EmptyPush,

    #[error("unsupported Gitea Pull Request action: {action}")]
    UnsupportedAction { action: String },

    #[error("unsupported Gitea create ref type: {ref_type}")]
    UnsupportedRefType { ref_type: String },

    #[error("Invalid repository URL '{url}': {message}")]
    InvalidRepositoryUrl { url: String, message: String },

    #[error("Event validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Converts one payload kind's raw bytes into a canonical event.
///
/// Implementations are registered once at startup and shared read-only across
/// the process lifetime, so they must be `Send + Sync` and stateless.
pub trait CdEventTranslator: Send + Sync {
    fn translate(&self, data: &[u8]) -> Result<CdEvent, TranslationError>;
}

/// Event attributes derived from a repository's canonical URL.
///
/// Single point of truth for the `source` / `subject_source` derivation: all
/// translators go through here, which is what keeps the three mandatory event
/// fields mutually consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySource {
    /// Origin host, e.g. `git.example.com`
    pub source: String,
    /// Origin host plus repository path, e.g. `git.example.com/yoloco/project1`
    pub subject_source: String,
}

impl RepositorySource {
    /// Parse a repository HTML URL into (host, host + path).
    pub fn from_repository_url(raw_url: &str) -> Result<Self, TranslationError> {
        let parsed = Url::parse(raw_url).map_err(|e| TranslationError::InvalidRepositoryUrl {
            url: raw_url.to_string(),
            message: e.to_string(),
        })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| TranslationError::InvalidRepositoryUrl {
                url: raw_url.to_string(),
                message: "URL has no host".to_string(),
            })?;

        let path = parsed.path().trim_end_matches('/');

        Ok(Self {
            source: host.to_string(),
            subject_source: format!("{host}{path}"),
        })
    }
}
