//! Reader loop and inbound dispatch tasks

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::control::{ControlMessage, ControlResponse, Salvaged};
use crate::error::{ClaudeError, Result};
use crate::message::parse_message;
use crate::transport::Transport;
use crate::types::identifiers::RequestId;
use crate::types::messages::Message;

use super::Shared;

/// The only consumer of the transport's object stream
///
/// Runs until the stream ends, a fatal transport error arrives, the consumer
/// goes away or the connection shuts down.
pub(super) async fn reader_loop<T: Transport + 'static>(
    shared: Arc<Shared<T>>,
    mut incoming: mpsc::Receiver<Result<Value>>,
    messages: mpsc::Sender<Result<Message>>,
) {
    loop {
        let item = tokio::select! {
            biased;
            () = shared.shutdown.cancelled() => return,
            item = incoming.recv() => item,
        };

        let Some(item) = item else {
            log::debug!("Transport stream ended");
            shared.terminate(ClaudeError::connection_closed);
            return;
        };

        match item {
            Ok(value) => {
                if !route(&shared, value, &messages).await {
                    return;
                }
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("Dropped one malformed message: {e}");
                if !forward(&shared, &messages, Err(e)).await {
                    return;
                }
            }
            Err(e) => {
                log::error!("Transport failed: {e}");
                let reason = e.to_string();
                shared.terminate(|| ClaudeError::connection(reason.clone()));
                forward(&shared, &messages, Err(e)).await;
                return;
            }
        }
    }
}

/// Route one decoded object; returns `false` when the loop should stop
async fn route<T: Transport + 'static>(
    shared: &Arc<Shared<T>>,
    value: Value,
    messages: &mpsc::Sender<Result<Message>>,
) -> bool {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let is_control = kind.starts_with("control_");
    let is_result = kind == "result";

    if is_control {
        match ControlMessage::deserialize(&value) {
            Ok(ControlMessage::ControlResponse { response }) => {
                shared.protocol.handle_response(response);
            }
            Ok(ControlMessage::ControlRequest {
                request_id,
                request,
            }) => spawn_dispatch(shared, request_id, request),
            Ok(ControlMessage::ControlCancelRequest { request_id }) => {
                log::debug!("Ignoring control_cancel_request for {request_id:?}");
            }
            Err(e) => salvage(shared, &value, &e),
        }
        return true;
    }

    if is_result {
        shared.signal_first_result();
    }
    forward(shared, messages, parse_message(value)).await
}

/// Hand a message to the consumer, waiting while the channel is full
async fn forward<T: Transport + 'static>(
    shared: &Shared<T>,
    messages: &mpsc::Sender<Result<Message>>,
    item: Result<Message>,
) -> bool {
    tokio::select! {
        biased;
        () = shared.shutdown.cancelled() => false,
        sent = messages.send(item) => {
            if sent.is_err() {
                log::debug!("Message consumer dropped; stopping reader");
            }
            sent.is_ok()
        }
    }
}

/// Act on whatever an undecodable control envelope still identifies
fn salvage<T: Transport + 'static>(
    shared: &Arc<Shared<T>>,
    raw: &Value,
    error: &serde_json::Error,
) {
    match Salvaged::from_envelope(raw, error) {
        Some(Salvaged::Response(response)) => {
            log::debug!("Accepting irregular control response for {}", response.request_id());
            shared.protocol.handle_response(response);
        }
        Some(Salvaged::Reject { request_id, reason }) => {
            log::warn!("Rejecting control request {request_id}: {reason}");
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                let shutdown = shared.shutdown.clone();
                tokio::select! {
                    () = shutdown.cancelled() => {}
                    () = respond(&shared, ControlResponse::error(request_id, reason)) => {}
                }
            });
        }
        None => log::warn!("Dropping malformed control envelope: {error}"),
    }
}

fn spawn_dispatch<T: Transport + 'static>(
    shared: &Arc<Shared<T>>,
    request_id: RequestId,
    request: Value,
) {
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let shutdown = shared.shutdown.clone();
        let id = request_id.clone();
        tokio::select! {
            () = shutdown.cancelled() => {
                log::debug!("Abandoning control request {id}: connection closed");
            }
            () = answer(&shared, request_id, request) => {}
        }
    });
}

/// Run the handler and write exactly one response for `request_id`
async fn answer<T: Transport + 'static>(shared: &Shared<T>, request_id: RequestId, request: Value) {
    let _permit = match &shared.control_limit {
        Some(limit) => match limit.acquire().await {
            Ok(permit) => Some(permit),
            Err(_) => return,
        },
        None => None,
    };

    let response = match shared.dispatcher.dispatch(request).await {
        Ok(payload) => ControlResponse::success(request_id, payload),
        Err(e) => {
            log::warn!("Control request {request_id} failed: {e}");
            ControlResponse::error(request_id, e.wire_message())
        }
    };
    respond(shared, response).await;
}

/// Write one control response
async fn respond<T: Transport + 'static>(shared: &Shared<T>, response: ControlResponse) {
    let line = match shared
        .protocol
        .serialize_message(&ControlMessage::response(response))
    {
        Ok(line) => line,
        Err(e) => {
            log::error!("Failed to encode control response: {e}");
            return;
        }
    };

    if let Err(e) = shared.write(&line).await {
        log::error!("Failed to write control response: {e}");
    }
}
