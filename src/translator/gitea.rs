//! # Gitea Payload Translators
//!
//! One translator per Gitea webhook kind. Each deserializes the raw body
//! into a kind-specific shape, selects exactly one canonical-event variant
//! from the payload content, derives the source fields through
//! [`RepositorySource`], and attaches the original payload as tagged custom
//! data.

use crate::events::{CdEvent, CdEventType};
use crate::translator::{CdEventTranslator, RepositorySource, TranslationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Repository block shared by every Gitea webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaRepository {
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaCommit {
    pub id: String,
}

/// Gitea push webhook payload (the fields this adapter reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaPushEvent {
    pub total_commits: u64,
    #[serde(default)]
    pub commits: Vec<GiteaCommit>,
    pub repository: GiteaRepository,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaPullRequest {
    pub id: u64,
}

/// Gitea pull request webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaPullRequestEvent {
    pub action: String,
    pub pull_request: GiteaPullRequest,
    pub repository: GiteaRepository,
}

/// Gitea create webhook payload (branch/tag creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaCreateEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub ref_type: String,
    pub repository: GiteaRepository,
}

/// Gitea delete webhook payload (branch/tag deletion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiteaDeleteEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub ref_type: String,
    pub repository: GiteaRepository,
}

/// Translates push payloads into change-merged events.
///
/// A push reporting zero new commits is filtered out rather than converted
/// into a vacuous event.
pub struct GiteaPushTranslator;

impl CdEventTranslator for GiteaPushTranslator {
    fn translate(&self, data: &[u8]) -> Result<CdEvent, TranslationError> {
        let raw: Value = serde_json::from_slice(data)?;
        let payload: GiteaPushEvent = serde_json::from_value(raw.clone())?;

        if payload.total_commits == 0 || payload.commits.is_empty() {
            return Err(TranslationError::EmptyPush);
        }

        let sources = RepositorySource::from_repository_url(&payload.repository.html_url)?;

        let event = CdEvent::builder(CdEventType::ChangeMerged)
            .source(sources.source)
            .subject_source(sources.subject_source)
            .subject_id(payload.commits[0].id.as_str())
            .repository_id(payload.repository.full_name.as_str())
            .custom_data("GiteaPushEvent", raw)
            .build()?;

        Ok(event)
    }
}

/// Translates pull request payloads into change-created or change-merged
/// events depending on the `action` field.
pub struct GiteaPullRequestTranslator;

impl CdEventTranslator for GiteaPullRequestTranslator {
    fn translate(&self, data: &[u8]) -> Result<CdEvent, TranslationError> {
        let raw: Value = serde_json::from_slice(data)?;
        let payload: GiteaPullRequestEvent = serde_json::from_value(raw.clone())?;

        let event_type = match payload.action.as_str() {
            "opened" => CdEventType::ChangeCreated,
            "closed" => CdEventType::ChangeMerged,
            other => {
                return Err(TranslationError::UnsupportedAction {
                    action: other.to_string(),
                })
            }
        };

        let sources = RepositorySource::from_repository_url(&payload.repository.html_url)?;

        let event = CdEvent::builder(event_type)
            .source(sources.source)
            .subject_source(sources.subject_source)
            .subject_id(format!("pr-{}", payload.pull_request.id))
            .repository_id(payload.repository.full_name.as_str())
            .custom_data("GiteaPullRequestEvent", raw)
            .build()?;

        Ok(event)
    }
}

/// Translates create payloads into branch-created events.
pub struct GiteaCreateTranslator;

impl CdEventTranslator for GiteaCreateTranslator {
    fn translate(&self, data: &[u8]) -> Result<CdEvent, TranslationError> {
        let raw: Value = serde_json::from_slice(data)?;
        let payload: GiteaCreateEvent = serde_json::from_value(raw.clone())?;

        if payload.ref_type != "branch" {
            return Err(TranslationError::UnsupportedRefType {
                ref_type: payload.ref_type,
            });
        }

        let sources = RepositorySource::from_repository_url(&payload.repository.html_url)?;

        let event = CdEvent::builder(CdEventType::BranchCreated)
            .source(sources.source)
            .subject_source(sources.subject_source)
            .subject_id(payload.ref_name.as_str())
            .repository_id(payload.repository.full_name.as_str())
            .custom_data("GiteaCreateEvent", raw)
            .build()?;

        Ok(event)
    }
}

/// Translates delete payloads into branch-deleted events.
pub struct GiteaDeleteTranslator;

impl CdEventTranslator for GiteaDeleteTranslator {
    fn translate(&self, data: &[u8]) -> Result<CdEvent, TranslationError> {
        let raw: Value = serde_json::from_slice(data)?;
        let payload: GiteaDeleteEvent = serde_json::from_value(raw.clone())?;

        if payload.ref_type != "branch" {
            return Err(TranslationError::UnsupportedRefType {
                ref_type: payload.ref_type,
            });
        }

        let sources = RepositorySource::from_repository_url(&payload.repository.html_url)?;

        let event = CdEvent::builder(CdEventType::BranchDeleted)
            .source(sources.source)
            .subject_source(sources.subject_source)
            .subject_id(payload.ref_name.as_str())
            .repository_id(payload.repository.full_name.as_str())
            .custom_data("GiteaDeleteEvent", raw)
            .build()?;

        Ok(event)
    }
}
