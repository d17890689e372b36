// ==========================================
// Plant operations - customs transport
// ==========================================
// Seam between the customs client and the wire. The crate ships a
// scripted in-memory transport; no live endpoint is contacted.
// ==========================================

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::customs::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomsRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomsResponse {
    pub status: u16,
    pub body: String,
}

impl CustomsResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }
}

#[async_trait]
pub trait CustomsTransport: Send + Sync {
    async fn send(&self, request: CustomsRequest) -> Result<CustomsResponse, TransportError>;
}

// ==========================================
// ScriptedTransport
// ==========================================
// Replays queued responses in order and records every request.
// An exhausted script answers with a connection error.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<CustomsResponse, TransportError>>>,
    requests: Mutex<Vec<CustomsRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: CustomsResponse) {
        self.push(Ok(response));
    }

    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(&self, item: Result<CustomsResponse, TransportError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(item);
        }
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<CustomsRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CustomsTransport for ScriptedTransport {
    async fn send(&self, request: CustomsRequest) -> Result<CustomsResponse, TransportError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }

        let next = self
            .responses
            .lock()
            .map_err(|e| TransportError::Connection(format!("script lock poisoned: {}", e)))?
            .pop_front();

        next.unwrap_or_else(|| {
            Err(TransportError::Connection(
                "no scripted response left".to_string(),
            ))
        })
    }
}
