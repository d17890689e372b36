// ==========================================
// Plant operations - customs client errors
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure below the HTTP layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// Error body returned by the customs API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub field_errors: Vec<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum CustomsError {
    #[error("No documents provided")]
    NoDocuments,

    #[error("request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("customs API returned status {status}: {}", .detail.message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, detail: ErrorDetail },

    #[error("submission {submission_id} still {last_status} after {checks} status checks")]
    MonitoringTimeout {
        submission_id: String,
        checks: u32,
        last_status: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("signing key rejected: {0}")]
    InvalidKey(String),
}

pub type CustomsResult<T> = Result<T, CustomsError>;
