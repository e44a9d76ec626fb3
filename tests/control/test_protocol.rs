use std::collections::HashSet;

use claude_agent_protocol::control::{
    ControlMessage, ControlResponse, InboundRequest, OutboundRequest, ProtocolHandler,
};
use claude_agent_protocol::{ClaudeError, PermissionMode, RequestId};
use serde_json::json;

#[test]
fn test_request_id_generation() {
    let handler = ProtocolHandler::new();
    let id1 = handler.next_id();
    let id2 = handler.next_id();
    assert_ne!(id1, id2);
    assert!(id1.as_str().starts_with("req_1_"));
    assert!(id2.as_str().starts_with("req_2_"));
}

#[test]
fn test_request_ids_unique_across_handlers() {
    // Counters restart per connection; the random suffix keeps ids apart
    let ids: HashSet<_> = (0..50).map(|_| ProtocolHandler::new().next_id()).collect();
    assert_eq!(ids.len(), 50);
}

#[test]
fn test_serialize_message_is_one_line() {
    let handler = ProtocolHandler::new();
    let message = ControlMessage::request(handler.next_id(), &OutboundRequest::Interrupt).unwrap();

    let serialized = handler.serialize_message(&message).unwrap();
    assert!(serialized.ends_with('\n'));
    assert_eq!(serialized.matches('\n').count(), 1);

    let value: serde_json::Value = serde_json::from_str(serialized.trim()).unwrap();
    assert_eq!(value["type"], "control_request");
    assert_eq!(value["request"], json!({"subtype": "interrupt"}));
}

#[test]
fn test_initialize_request_shape() {
    let hooks = json!({"Stop": [{"matcher": null, "hookCallbackIds": ["hook_0"]}]});
    let message = ControlMessage::request(
        RequestId::new("req_1_0a0b0c0d"),
        &OutboundRequest::Initialize {
            hooks: Some(hooks.clone()),
        },
    )
    .unwrap();

    assert_eq!(
        serde_json::to_value(message).unwrap(),
        json!({
            "type": "control_request",
            "request_id": "req_1_0a0b0c0d",
            "request": {"subtype": "initialize", "hooks": hooks}
        })
    );
}

#[test]
fn test_outbound_subtypes() {
    assert_eq!(OutboundRequest::Interrupt.subtype(), "interrupt");
    assert_eq!(
        OutboundRequest::SetPermissionMode {
            mode: PermissionMode::Plan
        }
        .subtype(),
        "set_permission_mode"
    );
    assert_eq!(
        OutboundRequest::SetModel { model: None }.subtype(),
        "set_model"
    );
}

#[test]
fn test_deserialize_invalid_message_structure() {
    let result = serde_json::from_value::<ControlMessage>(json!({"type": "unknown_type"}));
    assert!(result.is_err());
}

#[test]
fn test_deserialize_missing_fields() {
    let result = serde_json::from_value::<ControlMessage>(json!({"type": "control_request"}));
    assert!(result.is_err());
}

#[test]
fn test_success_without_payload() {
    let message: ControlMessage = serde_json::from_value(json!({
        "type": "control_response",
        "response": {"subtype": "success", "request_id": "req_1_aaaaaaaa"}
    }))
    .unwrap();
    let ControlMessage::ControlResponse { response } = message else {
        panic!("Wrong message type");
    };
    assert_eq!(
        response,
        ControlResponse::Success {
            request_id: RequestId::new("req_1_aaaaaaaa"),
            response: None,
        }
    );
}

#[tokio::test]
async fn test_handle_response_with_missing_pending_request() {
    let handler = ProtocolHandler::new();

    let response = ControlResponse::success(RequestId::new("non-existent-req"), json!({}));
    assert!(!handler.handle_response(response));
    assert_eq!(handler.pending_count(), 0);
}

#[tokio::test]
async fn test_response_reaches_its_waiter() {
    let handler = ProtocolHandler::new();
    let id = handler.next_id();
    let rx = handler.register(id.clone(), "interrupt").unwrap();
    assert_eq!(handler.pending_count(), 1);

    assert!(handler.handle_response(ControlResponse::success(id.clone(), json!({"ok": 1}))));
    assert_eq!(rx.await.unwrap().unwrap(), json!({"ok": 1}));

    // A duplicate response finds nothing
    assert!(!handler.handle_response(ControlResponse::success(id, json!({}))));
}

#[tokio::test]
async fn test_missing_payload_becomes_empty_object() {
    let handler = ProtocolHandler::new();
    let id = handler.next_id();
    let rx = handler.register(id.clone(), "interrupt").unwrap();

    handler.handle_response(ControlResponse::Success {
        request_id: id,
        response: None,
    });
    assert_eq!(rx.await.unwrap().unwrap(), json!({}));
}

#[tokio::test]
async fn test_error_response_keeps_subtype() {
    let handler = ProtocolHandler::new();
    let id = handler.next_id();
    let rx = handler.register(id.clone(), "set_model").unwrap();

    handler.handle_response(ControlResponse::error(id, "bad model"));
    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Control request 'set_model' failed: bad model");
}

#[test]
fn test_duplicate_registration_rejected() {
    let handler = ProtocolHandler::new();
    let id = RequestId::new("req_1_11111111");
    let _rx = handler.register(id.clone(), "interrupt").unwrap();
    assert!(matches!(
        handler.register(id, "interrupt"),
        Err(ClaudeError::ControlProtocol(_))
    ));
}

#[tokio::test]
async fn test_deregister_then_late_response() {
    let handler = ProtocolHandler::new();
    let id = handler.next_id();
    let rx = handler.register(id.clone(), "interrupt").unwrap();

    assert!(handler.deregister(&id));
    assert!(!handler.deregister(&id));
    assert!(!handler.handle_response(ControlResponse::success(id, json!({}))));
    assert!(rx.await.is_err());
}

#[tokio::test]
async fn test_fail_all_releases_every_waiter() {
    let handler = ProtocolHandler::new();
    let receivers: Vec<_> = (0..3)
        .map(|_| handler.register(handler.next_id(), "interrupt").unwrap())
        .collect();

    assert_eq!(handler.fail_all(ClaudeError::connection_closed), 3);
    assert_eq!(handler.pending_count(), 0);
    for rx in receivers {
        assert!(rx.await.unwrap().unwrap_err().is_connection_closed());
    }
}

#[test]
fn test_inbound_request_parsing() {
    let request = InboundRequest::parse(json!({
        "subtype": "can_use_tool",
        "tool_name": "Edit",
    }))
    .unwrap();
    let InboundRequest::CanUseTool(check) = request else {
        panic!("Wrong request type");
    };
    assert_eq!(check.tool_name.as_str(), "Edit");
    assert_eq!(check.input, json!({}));

    let request = InboundRequest::parse(json!({
        "subtype": "mcp_message",
        "server_name": "calc",
        "message": {"jsonrpc": "2.0", "method": "tools/list"}
    }))
    .unwrap();
    assert!(matches!(request, InboundRequest::McpMessage(m) if m.server_name == "calc"));

    // hook_callback needs a callback id
    assert!(InboundRequest::parse(json!({"subtype": "hook_callback"})).is_err());
}
