//! # Adapter Configuration
//!
//! Environment-driven configuration read once at startup and immutable
//! afterwards. Every knob has a default that matches a local single-node
//! NATS setup, so `cdevents-adapter` starts with no environment at all.
//!
//! ## Surface
//!
//! | Variable                | Default                    |
//! |-------------------------|----------------------------|
//! | `HTTP_PORT`             | `8080`                     |
//! | `NATS_URL`              | `nats://localhost:4222`    |
//! | `LOG_LEVEL`             | `info`                     |
//! | `WEBHOOK_STREAM_NAME`   | `cdevents-adapter-webhooks`|
//! | `WEBHOOK_SUBJECT_BASE`  | `webhooks`                 |
//! | `WEBHOOK_CONSUMER_NAME` | `cdevents-adapter`         |
//! | `EVENT_STREAM_NAME`     | `cdevents-adapter-events`  |
//! | `EVENT_SUBJECT_BASE`    | `dev.cdevents`             |

use crate::error::{AdapterError, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Root configuration for the adapter process.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Port the HTTP ingress listens on
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// NATS server address
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Log verbosity (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Name of the inbound webhook stream (work-queue retention)
    #[serde(default = "default_webhook_stream_name")]
    pub webhook_stream_name: String,

    /// Subject prefix under which raw webhook bodies are appended
    #[serde(default = "default_webhook_subject_base")]
    pub webhook_subject_base: String,

    /// Durable name of the webhook stream consumer
    #[serde(default = "default_webhook_consumer_name")]
    pub webhook_consumer_name: String,

    /// Name of the outbound event stream
    #[serde(default = "default_event_stream_name")]
    pub event_stream_name: String,

    /// Subject prefix for outbound canonical events
    #[serde(default = "default_event_subject_base")]
    pub event_subject_base: String,
}

fn default_http_port() -> u16 {
    8080
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_webhook_stream_name() -> String {
    "cdevents-adapter-webhooks".to_string()
}

fn default_webhook_subject_base() -> String {
    "webhooks".to_string()
}

fn default_webhook_consumer_name() -> String {
    "cdevents-adapter".to_string()
}

fn default_event_stream_name() -> String {
    "cdevents-adapter-events".to_string()
}

fn default_event_subject_base() -> String {
    "dev.cdevents".to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            nats_url: default_nats_url(),
            log_level: default_log_level(),
            webhook_stream_name: default_webhook_stream_name(),
            webhook_subject_base: default_webhook_subject_base(),
            webhook_consumer_name: default_webhook_consumer_name(),
            event_stream_name: default_event_stream_name(),
            event_subject_base: default_event_subject_base(),
        }
    }
}

impl AdapterConfig {
    /// Load configuration from the process environment.
    ///
    /// `HTTP_PORT` maps to `http_port` and so on; unset variables fall back
    /// to the serde defaults above.
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Environment::default())
            .build()
            .map_err(|e| AdapterError::configuration(e.to_string()))?;

        let config: AdapterConfig = settings
            .try_deserialize()
            .map_err(|e| AdapterError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_subject_base.is_empty() {
            return Err(AdapterError::configuration(
                "WEBHOOK_SUBJECT_BASE must not be empty",
            ));
        }
        if self.webhook_subject_base.contains('>') || self.webhook_subject_base.contains('*') {
            return Err(AdapterError::configuration(
                "WEBHOOK_SUBJECT_BASE must not contain wildcard tokens",
            ));
        }
        if self.event_subject_base.is_empty() {
            return Err(AdapterError::configuration(
                "EVENT_SUBJECT_BASE must not be empty",
            ));
        }
        Ok(())
    }

    /// Wildcard subject filter covering everything under the webhook base.
    pub fn webhook_subject_filter(&self) -> String {
        format!("{}.>", self.webhook_subject_base)
    }

    /// Wildcard subject filter covering everything under the event base.
    pub fn event_subject_filter(&self) -> String {
        format!("{}.>", self.event_subject_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.webhook_stream_name, "cdevents-adapter-webhooks");
        assert_eq!(config.webhook_subject_base, "webhooks");
        assert_eq!(config.webhook_consumer_name, "cdevents-adapter");
        assert_eq!(config.event_stream_name, "cdevents-adapter-events");
        assert_eq!(config.event_subject_base, "dev.cdevents");
    }

    #[test]
    fn test_subject_filters() {
        let config = AdapterConfig::default();
        assert_eq!(config.webhook_subject_filter(), "webhooks.>");
        assert_eq!(config.event_subject_filter(), "dev.cdevents.>");
    }

    #[test]
    fn test_validate_rejects_wildcard_base() {
        let config = AdapterConfig {
            webhook_subject_base: "webhooks.>".to_string(),
            ..AdapterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base() {
        let config = AdapterConfig {
            event_subject_base: String::new(),
            ..AdapterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
