//! # Crate-Level Error Types
//!
//! Startup and bootstrap errors. Per-message errors live in
//! [`crate::messaging::errors`] so the retry taxonomy stays next to the
//! processor that interprets it.

use thiserror::Error;

/// Errors that abort process startup.
///
/// All of these are fatal: the process logs them and exits non-zero rather
/// than degrading into a half-connected state.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Broker connection error: {message}")]
    BrokerConnection { message: String },

    #[error("Stream provisioning failed: {stream_name}: {message}")]
    StreamProvisioning {
        stream_name: String,
        message: String,
    },

    #[error("Consumer provisioning failed: {consumer_name}: {message}")]
    ConsumerProvisioning {
        consumer_name: String,
        message: String,
    },

    #[error("HTTP server error: {message}")]
    HttpServer { message: String },

    #[error("Shutdown timed out after {timeout_seconds}s")]
    ShutdownTimeout { timeout_seconds: u64 },
}

impl AdapterError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a broker connection error
    pub fn broker_connection(message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            message: message.into(),
        }
    }

    /// Create a stream provisioning error
    pub fn stream_provisioning(
        stream_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::StreamProvisioning {
            stream_name: stream_name.into(),
            message: message.into(),
        }
    }

    /// Create a consumer provisioning error
    pub fn consumer_provisioning(
        consumer_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConsumerProvisioning {
            consumer_name: consumer_name.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP server error
    pub fn http_server(message: impl Into<String>) -> Self {
        Self::HttpServer {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
