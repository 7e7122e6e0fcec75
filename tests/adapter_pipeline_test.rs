//! End-to-end pipeline tests: real Gitea payload fixtures through the
//! default translator registry and the message processor, with the broker
//! replaced by in-memory doubles.

use async_trait::async_trait;
use cdevents_adapter::events::{CdEvent, CdEventType};
use cdevents_adapter::messaging::{
    DeliveryMetadata, EventPublisher, InboundMessage, MessageProcessor, MessagingError,
    ProcessingError, PublishError,
};
use cdevents_adapter::translator::TranslatorRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct FixtureMessage {
    subject: String,
    payload: Vec<u8>,
    acked: AtomicBool,
}

impl FixtureMessage {
    fn new(subject: &str, fixture: &str) -> Self {
        let path = format!("{}/tests/fixtures/{fixture}", env!("CARGO_MANIFEST_DIR"));
        let payload = std::fs::read(&path).unwrap_or_else(|e| panic!("read {path}: {e}"));
        Self {
            subject: subject.to_string(),
            payload,
            acked: AtomicBool::new(false),
        }
    }

    fn acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InboundMessage for FixtureMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_metadata(&self) -> Result<DeliveryMetadata, MessagingError> {
        Ok(DeliveryMetadata {
            stream: "cdevents-adapter-webhooks".to_string(),
            consumer: "cdevents-adapter".to_string(),
            stream_sequence: 1,
            consumer_sequence: 1,
            delivered: 1,
        })
    }

    async fn ack(&self) -> Result<(), MessagingError> {
        self.acked.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<CdEvent>>,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<CdEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &CdEvent) -> Result<(), PublishError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn pipeline() -> (MessageProcessor, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let processor = MessageProcessor::new(
        Arc::new(TranslatorRegistry::with_default_translators()),
        publisher.clone(),
    );
    (processor, publisher)
}

#[tokio::test]
async fn push_with_one_commit_yields_change_merged() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.push", "gitea_push.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event_type(), Some(CdEventType::ChangeMerged));
    assert_eq!(event.subject.id, "bffeb74224043ba2feb48d137756c8971549d7d7");
    assert_eq!(event.context.source, "git.example.com");
    assert_eq!(event.subject.source, "git.example.com/yoloco/project1");
    assert_eq!(event.subject.content.repository.id, "yoloco/project1");
    assert!(message.acked());
}

#[tokio::test]
async fn push_event_keeps_original_payload_as_custom_data() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.push", "gitea_push.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    let custom_data = events[0].custom_data.as_ref().unwrap();
    assert_eq!(custom_data.kind, "GiteaPushEvent");
    // Fields the translator never reads survive in the audit payload.
    assert_eq!(custom_data.content["ref"], "refs/heads/main");
    assert_eq!(
        custom_data.content["commits"][0]["author"]["username"],
        "yoloco"
    );
}

#[tokio::test]
async fn push_with_zero_commits_is_filtered_and_removed() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.push", "gitea_push_empty.json");

    let err = processor.process(&message).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Push event contains no new commits, will not convert to a CD Event"
    );
    assert!(err.is_permanent());
    assert!(publisher.events().is_empty());
    assert!(message.acked());
}

#[tokio::test]
async fn pull_request_opened_yields_change_created() {
    let (processor, publisher) = pipeline();
    let message =
        FixtureMessage::new("webhooks.gitea.pull_request", "gitea_pull_request_opened.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type(), Some(CdEventType::ChangeCreated));
    assert_eq!(events[0].subject.id, "pr-91");
    assert_eq!(events[0].subject.source, "git.example.com/yoloco/project1");
}

#[tokio::test]
async fn pull_request_closed_yields_change_merged() {
    let (processor, publisher) = pipeline();
    let message =
        FixtureMessage::new("webhooks.gitea.pull_request", "gitea_pull_request_closed.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    assert_eq!(events[0].event_type(), Some(CdEventType::ChangeMerged));
    assert_eq!(events[0].subject.id, "pr-91");
}

#[tokio::test]
async fn create_branch_yields_branch_created() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.create", "gitea_create_branch.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    assert_eq!(events[0].event_type(), Some(CdEventType::BranchCreated));
    assert_eq!(events[0].subject.id, "foo");
    assert_eq!(events[0].subject.subject_type, "branch");
}

#[tokio::test]
async fn create_tag_is_rejected_naming_the_ref_type() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.create", "gitea_create_tag.json");

    let err = processor.process(&message).await.unwrap_err();

    assert_eq!(err.to_string(), "unsupported Gitea create ref type: tag");
    assert!(err.is_permanent());
    assert!(publisher.events().is_empty());
    assert!(message.acked());
}

#[tokio::test]
async fn delete_branch_yields_branch_deleted() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.delete", "gitea_delete_branch.json");

    processor.process(&message).await.unwrap();

    let events = publisher.events();
    assert_eq!(events[0].event_type(), Some(CdEventType::BranchDeleted));
    assert_eq!(events[0].subject.id, "foo");
}

#[tokio::test]
async fn unroutable_kind_never_reaches_a_translator() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.star", "gitea_push.json");

    let err = processor.process(&message).await.unwrap_err();

    assert_eq!(err.to_string(), "no translator found for subject: gitea.star");
    assert!(matches!(err, ProcessingError::UnknownRoutingKey { .. }));
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn published_event_envelope_is_wire_ready() {
    let (processor, publisher) = pipeline();
    let message = FixtureMessage::new("webhooks.gitea.push", "gitea_push.json");

    processor.process(&message).await.unwrap();

    let value = serde_json::to_value(&publisher.events()[0]).unwrap();
    assert_eq!(value["context"]["version"], "0.4.1");
    assert_eq!(value["context"]["type"], "dev.cdevents.change.merged.0.3.0");
    assert!(value["context"]["id"].as_str().is_some());
    assert!(value["context"]["timestamp"].as_str().is_some());
    assert_eq!(value["subject"]["content"]["repository"]["id"], "yoloco/project1");
    assert_eq!(value["customDataContentType"], "application/json");
}
