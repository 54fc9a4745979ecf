//! Rebalance errors
//!
//! Every error is terminal for the input being processed. Nothing is
//! retried; the host scheduler runs again on its next tick.

use autobalance_core::ValidationError;
use thiserror::Error;

/// Rebalance errors
#[derive(Error, Debug)]
pub enum RebalanceError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// TLS or connection failure. Disabling certificate verification is an
    /// operator decision and never happens automatically.
    #[error(
        "Call to {endpoint} failed: {source}. Check the manager URL and CA certificate, \
         or set insecure = true if the manager uses a self-signed certificate"
    )]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{method} {endpoint} failed with status_code={status} text={body}")]
    Http {
        method: &'static str,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RebalanceError>;

impl RebalanceError {
    /// Short classification used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            RebalanceError::Validation(_) => "validation",
            RebalanceError::Transport { .. } => "transport",
            RebalanceError::Http { .. } => "http",
            RebalanceError::MalformedResponse { .. } => "malformed_response",
        }
    }

    pub fn transport(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RebalanceError::Transport {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        RebalanceError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
