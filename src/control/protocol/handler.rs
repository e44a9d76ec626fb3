//! Request ids and the pending-request table

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::RequestId;

use super::messages::{ControlMessage, ControlResponse};

/// Outbound request awaiting its response
struct PendingRequest {
    /// Subtype, for error reporting
    subtype: &'static str,
    /// Delivers the payload or the remote error
    response_tx: oneshot::Sender<Result<Value>>,
}

/// Correlates outbound control requests with their responses
///
/// Every lookup-and-remove happens under one short lock, so a response,
/// a timeout and a close racing for the same id resolve it exactly once.
pub struct ProtocolHandler {
    next_request_id: AtomicU64,
    pending_requests: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl ProtocolHandler {
    /// Create a handler with no pending requests
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_request_id: AtomicU64::new(1),
            pending_requests: Mutex::new(HashMap::new()),
        }
    }

    /// Generate the next request id
    ///
    /// Format: `req_{counter}_{8 hex chars}`. The counter keeps ids unique for
    /// the session; the random suffix keeps them unguessable.
    #[must_use]
    pub fn next_id(&self) -> RequestId {
        let counter = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let random = uuid::Uuid::new_v4().simple().to_string();
        RequestId::new(format!("req_{counter}_{}", &random[..8]))
    }

    /// Start waiting for the response to `id`
    ///
    /// # Errors
    /// Returns `ControlProtocol` if `id` is already pending
    pub fn register(
        &self,
        id: RequestId,
        subtype: &'static str,
    ) -> Result<oneshot::Receiver<Result<Value>>> {
        let (response_tx, response_rx) = oneshot::channel();
        let mut pending = self.pending_requests.lock();
        if pending.contains_key(&id) {
            return Err(ClaudeError::control_protocol(format!(
                "request id already pending: {id}"
            )));
        }
        pending.insert(
            id,
            PendingRequest {
                subtype,
                response_tx,
            },
        );
        Ok(response_rx)
    }

    /// Stop waiting for `id`; returns whether it was still pending
    pub fn deregister(&self, id: &RequestId) -> bool {
        self.pending_requests.lock().remove(id).is_some()
    }

    /// Deliver a response to its waiter
    ///
    /// Returns `false` for stale or unknown ids; the response is dropped.
    /// Never blocks: a waiter that already gave up is skipped.
    pub fn handle_response(&self, response: ControlResponse) -> bool {
        let Some(pending) = self.pending_requests.lock().remove(response.request_id()) else {
            log::debug!(
                "Discarding control response for unknown request {}",
                response.request_id()
            );
            return false;
        };

        let outcome = match response {
            ControlResponse::Success { response, .. } => {
                Ok(response.unwrap_or_else(|| Value::Object(serde_json::Map::new())))
            }
            ControlResponse::Error { error, .. } => {
                Err(ClaudeError::control_request(pending.subtype, error))
            }
        };
        let _ = pending.response_tx.send(outcome);
        true
    }

    /// Resolve every pending request with an error
    ///
    /// Returns how many waiters were released.
    pub fn fail_all(&self, error: impl Fn() -> ClaudeError) -> usize {
        let drained: Vec<_> = self.pending_requests.lock().drain().collect();
        let count = drained.len();
        for (_, pending) in drained {
            let _ = pending.response_tx.send(Err(error()));
        }
        count
    }

    /// Number of requests awaiting a response
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_requests.lock().len()
    }

    /// Serialize an envelope as one newline-terminated line
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    pub fn serialize_message(&self, message: &ControlMessage) -> Result<String> {
        serde_json::to_string(message)
            .map(|s| format!("{s}\n"))
            .map_err(|e| ClaudeError::control_protocol(format!("Failed to serialize message: {e}")))
    }
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters a pending request when the waiting caller goes away
pub(crate) struct PendingGuard<'a> {
    handler: &'a ProtocolHandler,
    id: RequestId,
}

impl<'a> PendingGuard<'a> {
    pub(crate) const fn new(handler: &'a ProtocolHandler, id: RequestId) -> Self {
        Self { handler, id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.handler.deregister(&self.id);
    }
}
