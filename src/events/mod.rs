//! # Canonical Event Model
//!
//! CDEvents is the closed set of canonical events this adapter emits. Each
//! event is a variant tag ([`CdEventType`]) plus the CDEvents v0.4 envelope:
//! a `context` block (spec version, generated id, origin source, type string,
//! timestamp), a `subject` block (stable subject id, subject source, and a
//! repository reference), and an opaque custom-data block carrying the
//! original webhook payload for audit.
//!
//! Events are created through [`CdEventBuilder`], which refuses to produce an
//! event with an empty `source`, `subject_id`, or `subject_source`. Once
//! built, an event is never mutated; ownership passes from translator to
//! publisher to the wire.
//!
//! ## Usage
//!
//! ```rust
//! use cdevents_adapter::events::{CdEvent, CdEventType};
//!
//! let event = CdEvent::builder(CdEventType::BranchCreated)
//!     .source("git.example.com")
//!     .subject_id("feature-1")
//!     .subject_source("git.example.com/yoloco/project1")
//!     .repository_id("yoloco/project1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(event.event_type(), Some(CdEventType::BranchCreated));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// CDEvents context schema version emitted by this adapter.
pub const CDEVENTS_SPEC_VERSION: &str = "0.4.1";

/// Content type recorded alongside the custom-data block.
pub const CUSTOM_DATA_CONTENT_TYPE: &str = "application/json";

/// The closed set of canonical event variants the adapter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CdEventType {
    ChangeCreated,
    ChangeMerged,
    BranchCreated,
    BranchDeleted,
}

impl CdEventType {
    /// Fully-qualified CDEvents type string, also used as the outbound
    /// publish subject.
    pub fn as_str(&self) -> &'static str {
        match self {
            CdEventType::ChangeCreated => "dev.cdevents.change.created.0.3.0",
            CdEventType::ChangeMerged => "dev.cdevents.change.merged.0.3.0",
            CdEventType::BranchCreated => "dev.cdevents.branch.created.0.2.0",
            CdEventType::BranchDeleted => "dev.cdevents.branch.deleted.0.2.0",
        }
    }

    /// CDEvents subject type for this variant.
    pub fn subject_type(&self) -> &'static str {
        match self {
            CdEventType::ChangeCreated | CdEventType::ChangeMerged => "change",
            CdEventType::BranchCreated | CdEventType::BranchDeleted => "branch",
        }
    }

    /// Reverse mapping from a CDEvents type string, `None` for anything
    /// outside the closed set.
    pub fn from_type_string(s: &str) -> Option<Self> {
        match s {
            "dev.cdevents.change.created.0.3.0" => Some(CdEventType::ChangeCreated),
            "dev.cdevents.change.merged.0.3.0" => Some(CdEventType::ChangeMerged),
            "dev.cdevents.branch.created.0.2.0" => Some(CdEventType::BranchCreated),
            "dev.cdevents.branch.deleted.0.2.0" => Some(CdEventType::BranchDeleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for CdEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to an entity by id, per the CDEvents link format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Variant content: every variant this adapter emits points at the
/// repository the change or branch belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectContent {
    pub repository: Reference,
}

/// CDEvents context block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdEventContext {
    pub version: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
}

/// CDEvents subject block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdEventSubject {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    pub content: SubjectContent,
}

/// Original webhook payload tagged with the kind that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    pub kind: String,
    pub content: Value,
}

/// A validated canonical event, immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdEvent {
    pub context: CdEventContext,
    pub subject: CdEventSubject,
    #[serde(rename = "customData", skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
    #[serde(
        rename = "customDataContentType",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_data_content_type: Option<String>,
}

impl CdEvent {
    /// Start building an event of the given variant.
    pub fn builder(event_type: CdEventType) -> CdEventBuilder {
        CdEventBuilder::new(event_type)
    }

    /// The variant tag this event carries, `None` when `context.type` names
    /// no known variant. Always `Some` for events built through
    /// [`CdEventBuilder`]; deserialized events can carry anything.
    pub fn event_type(&self) -> Option<CdEventType> {
        CdEventType::from_type_string(&self.context.event_type)
    }
}

/// Validation failures from [`CdEventBuilder::build`].
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Canonical event is missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Builder enforcing the canonical-event invariants.
#[derive(Debug, Default)]
pub struct CdEventBuilder {
    event_type: Option<CdEventType>,
    source: String,
    subject_id: String,
    subject_source: String,
    repository_id: String,
    custom_data: Option<CustomData>,
}

impl CdEventBuilder {
    fn new(event_type: CdEventType) -> Self {
        Self {
            event_type: Some(event_type),
            ..Self::default()
        }
    }

    /// Origin host of the event (e.g. `git.example.com`)
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Stable identifier of the changed entity
    pub fn subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = subject_id.into();
        self
    }

    /// Origin host plus repository path
    pub fn subject_source(mut self, subject_source: impl Into<String>) -> Self {
        self.subject_source = subject_source.into();
        self
    }

    /// Full repository name (e.g. `yoloco/project1`)
    pub fn repository_id(mut self, repository_id: impl Into<String>) -> Self {
        self.repository_id = repository_id.into();
        self
    }

    /// Attach the original payload, tagged with its originating kind.
    pub fn custom_data(mut self, kind: impl Into<String>, content: Value) -> Self {
        self.custom_data = Some(CustomData {
            kind: kind.into(),
            content,
        });
        self
    }

    /// Produce a validated event or fail on a missing mandatory attribute.
    pub fn build(self) -> Result<CdEvent, ValidationError> {
        let event_type = self
            .event_type
            .ok_or(ValidationError::MissingField { field: "type" })?;
        if self.source.is_empty() {
            return Err(ValidationError::MissingField { field: "source" });
        }
        if self.subject_id.is_empty() {
            return Err(ValidationError::MissingField { field: "subject.id" });
        }
        if self.subject_source.is_empty() {
            return Err(ValidationError::MissingField {
                field: "subject.source",
            });
        }
        if self.repository_id.is_empty() {
            return Err(ValidationError::MissingField {
                field: "subject.content.repository.id",
            });
        }

        let has_custom_data = self.custom_data.is_some();

        Ok(CdEvent {
            context: CdEventContext {
                version: CDEVENTS_SPEC_VERSION.to_string(),
                id: Uuid::new_v4().to_string(),
                source: self.source,
                event_type: event_type.as_str().to_string(),
                timestamp: Utc::now(),
            },
            subject: CdEventSubject {
                id: self.subject_id,
                source: self.subject_source,
                subject_type: event_type.subject_type().to_string(),
                content: SubjectContent {
                    repository: Reference {
                        id: self.repository_id,
                        source: None,
                    },
                },
            },
            custom_data: self.custom_data,
            custom_data_content_type: has_custom_data
                .then(|| CUSTOM_DATA_CONTENT_TYPE.to_string()),
        })
    }
}
