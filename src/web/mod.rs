//! # HTTP Ingress
//!
//! Thin axum application in front of the inbound stream. The webhook
//! endpoint appends raw bodies, unmodified, to the durable webhook stream
//! under `<subject base>.<suffix>` — translation happens later, in the
//! worker, never here. Health endpoints follow the usual split: `healthz`
//! answers while the process is alive, `readyz` only while the broker
//! connection is up.
//!
//! The handlers talk to the broker through two narrow seams,
//! [`ConnectionStatus`] and [`WebhookSink`], with the production
//! implementations over the NATS client and JetStream context.

use crate::messaging::PublishError;
use async_nats::connection::State;
use async_nats::jetstream;
use async_trait::async_trait;
use axum::extract::{Path, State as AxumState};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Readiness source for the `readyz` endpoint.
pub trait ConnectionStatus: Send + Sync {
    fn is_connected(&self) -> bool;
}

impl ConnectionStatus for async_nats::Client {
    fn is_connected(&self) -> bool {
        matches!(self.connection_state(), State::Connected)
    }
}

/// Durable append target for raw webhook bodies. Returns the stream
/// sequence assigned to the appended message.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn append(&self, subject: String, body: Bytes) -> Result<u64, PublishError>;
}

#[async_trait]
impl WebhookSink for jetstream::Context {
    async fn append(&self, subject: String, body: Bytes) -> Result<u64, PublishError> {
        let ack = self
            .publish(subject, body)
            .await
            .map_err(|e| PublishError::transport(e.to_string()))?
            .await
            .map_err(|e| PublishError::transport(e.to_string()))?;
        Ok(ack.sequence)
    }
}

/// Shared state for the ingress handlers.
#[derive(Clone)]
pub struct AppState {
    status: Arc<dyn ConnectionStatus>,
    sink: Arc<dyn WebhookSink>,
    webhook_subject_base: String,
}

impl AppState {
    pub fn new(
        status: impl ConnectionStatus + 'static,
        sink: impl WebhookSink + 'static,
        webhook_subject_base: impl Into<String>,
    ) -> Self {
        Self {
            status: Arc::new(status),
            sink: Arc::new(sink),
            webhook_subject_base: webhook_subject_base.into(),
        }
    }
}

/// Response body for an accepted webhook.
#[derive(Serialize)]
struct WebhookAccepted {
    subject: String,
    sequence: u64,
}

/// Build the ingress router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/:suffix", post(receive_webhook))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Whether a webhook suffix is usable as the tail of a publish subject:
/// non-empty, no wildcard tokens, no whitespace.
fn valid_suffix(suffix: &str) -> bool {
    !suffix.is_empty()
        && !suffix.contains('>')
        && !suffix.contains('*')
        && !suffix.contains(' ')
}

/// `POST /webhook/{suffix}` — append the raw body to the inbound stream.
///
/// The suffix becomes the routing key later on (e.g. `gitea.push`), so it is
/// only sanity-checked here, never interpreted.
async fn receive_webhook(
    AxumState(state): AxumState<AppState>,
    Path(suffix): Path<String>,
    body: Bytes,
) -> Response {
    if !valid_suffix(&suffix) {
        return (StatusCode::BAD_REQUEST, "invalid webhook suffix").into_response();
    }

    let subject = format!("{}.{}", state.webhook_subject_base, suffix);

    match state.sink.append(subject.clone(), body).await {
        Ok(sequence) => {
            debug!(subject = %subject, sequence = sequence, "Accepted webhook");
            (
                StatusCode::ACCEPTED,
                Json(WebhookAccepted { subject, sequence }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(subject = %subject, error = %e, "Failed to append webhook to stream");
            (StatusCode::SERVICE_UNAVAILABLE, "webhook not persisted").into_response()
        }
    }
}

/// `GET /healthz` — always OK while the process is alive.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// `GET /readyz` — OK only while the broker connection is established.
async fn readyz(AxumState(state): AxumState<AppState>) -> Response {
    if state.status.is_connected() {
        (StatusCode::OK, "READY").into_response()
    } else {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct StaticStatus(bool);

    impl ConnectionStatus for StaticStatus {
        fn is_connected(&self) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        appended: Mutex<Vec<(String, Vec<u8>)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                appended: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn appended(&self) -> Vec<(String, Vec<u8>)> {
            self.appended.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookSink for RecordingSink {
        async fn append(&self, subject: String, body: Bytes) -> Result<u64, PublishError> {
            if self.fail {
                return Err(PublishError::transport("broker unavailable"));
            }
            let mut appended = self.appended.lock().unwrap();
            appended.push((subject, body.to_vec()));
            Ok(appended.len() as u64)
        }
    }

    #[async_trait]
    impl WebhookSink for Arc<RecordingSink> {
        async fn append(&self, subject: String, body: Bytes) -> Result<u64, PublishError> {
            (**self).append(subject, body).await
        }
    }

    fn app(connected: bool, sink: Arc<RecordingSink>) -> Router {
        router(AppState::new(StaticStatus(connected), sink, "webhooks"))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz_is_ok() {
        let app = app(true, Arc::new(RecordingSink::default()));
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_reports_ready_while_connected() {
        let app = app(true, Arc::new(RecordingSink::default()));
        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_is_unavailable_while_disconnected() {
        let app = app(false, Arc::new(RecordingSink::default()));
        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_webhook_appends_body_and_reports_sequence() {
        let sink = Arc::new(RecordingSink::default());
        let app = app(true, sink.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/gitea.push")
                    .body(Body::from("{\"total_commits\": 1}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["subject"], "webhooks.gitea.push");
        assert_eq!(body["sequence"], 1);

        let appended = sink.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, "webhooks.gitea.push");
        assert_eq!(appended[0].1, b"{\"total_commits\": 1}");
    }

    #[tokio::test]
    async fn test_webhook_rejects_wildcard_suffix() {
        let sink = Arc::new(RecordingSink::default());
        let app = app(true, sink.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/gitea.%3E")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sink.appended().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_reports_unavailable_when_append_fails() {
        let app = app(true, Arc::new(RecordingSink::failing()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/gitea.push")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_valid_suffix() {
        assert!(valid_suffix("gitea.push"));
        assert!(valid_suffix("gitea.pull_request"));
        assert!(!valid_suffix(""));
        assert!(!valid_suffix("gitea.>"));
        assert!(!valid_suffix("gitea.*"));
        assert!(!valid_suffix("gitea push"));
    }
}
