//! Tests for `ClaudeSDKClient` over a scripted transport

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use claude_agent_protocol::{
    ClaudeAgentOptions, ClaudeError, ClaudeSDKClient, ConnectionState, HookEvent, HookManager,
    HookMatcherBuilder, HookOutput, Message, PermissionManager, PermissionMode, PermissionResult,
};
use common::{assistant, client_with, init_logging, result, scripted};
use futures::StreamExt;
use serde_json::json;

#[tokio::test]
async fn test_client_handshake_and_server_info() {
    init_logging();
    let info = json!({"commands": [{"name": "compact"}], "output_style": "default"});
    let (client, _remote, request) = client_with(ClaudeAgentOptions::default(), info.clone()).await;

    assert_eq!(request["subtype"], "initialize");
    assert_eq!(client.server_info(), Some(info));
    assert_eq!(client.connection().state(), ConnectionState::Active);
}

#[tokio::test]
async fn test_send_message_uses_default_session() {
    let (client, mut remote, _) = client_with(ClaudeAgentOptions::default(), json!({})).await;

    client.send_message("What is 2 + 2?").await.unwrap();

    let written = remote.next_written().await;
    assert_eq!(written["type"], "user");
    assert_eq!(written["message"], json!({"role": "user", "content": "What is 2 + 2?"}));
    assert_eq!(written["session_id"], "default");
}

#[tokio::test]
async fn test_with_session_and_content_blocks() {
    let (client, mut remote, _) = client_with(ClaudeAgentOptions::default(), json!({})).await;
    let client = client.with_session("work");

    client
        .send_content(vec![json!({"type": "text", "text": "look"})])
        .await
        .unwrap();

    let written = remote.next_written().await;
    assert_eq!(written["session_id"], "work");
    assert_eq!(written["message"]["content"][0]["text"], "look");
}

#[tokio::test]
async fn test_receive_response_stops_after_result() {
    let (client, remote, _) = client_with(ClaudeAgentOptions::default(), json!({})).await;

    remote.send(assistant("first")).await;
    remote.send(result()).await;
    remote.send(assistant("second turn")).await;

    let turn: Vec<Message> = client
        .receive_response()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(turn.len(), 2);
    assert!(turn[1].is_result());

    let next = client.next_message().await.unwrap().unwrap();
    assert!(matches!(next, Message::Assistant(m) if m.text() == "second turn"));
}

#[tokio::test]
async fn test_control_requests_through_client() {
    let (client, mut remote, _) = client_with(ClaudeAgentOptions::default(), json!({})).await;

    let (outcome, ()) = tokio::join!(client.set_permission_mode(PermissionMode::Plan), async {
        let (id, request) = remote.expect_control_request("set_permission_mode").await;
        assert_eq!(request["mode"], "plan");
        remote.respond_success(&id, json!({})).await;
    });
    outcome.unwrap();

    let (outcome, ()) = tokio::join!(client.set_model(None), async {
        let (id, request) = remote.expect_control_request("set_model").await;
        assert!(request.get("model").is_none());
        remote.respond_success(&id, json!({})).await;
    });
    outcome.unwrap();

    let (outcome, ()) = tokio::join!(client.interrupt(), async {
        let (id, _) = remote.expect_control_request("interrupt").await;
        remote.respond_error(&id, "nothing to interrupt").await;
    });
    assert!(matches!(
        outcome.unwrap_err(),
        ClaudeError::ControlRequest { subtype, .. } if subtype == "interrupt"
    ));
}

#[tokio::test]
async fn test_callbacks_served_during_session() {
    init_logging();
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hook_calls);
    let options = ClaudeAgentOptions::builder()
        .can_use_tool(PermissionManager::callback(|tool, _input, _ctx| async move {
            if tool.as_str() == "Bash" {
                Ok(PermissionResult::deny("no shell"))
            } else {
                Ok(PermissionResult::allow())
            }
        }))
        .add_hook(
            HookEvent::UserPromptSubmit,
            HookMatcherBuilder::new(None::<String>)
                .add_hook(HookManager::callback(move |_input, _id, _ctx| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async {
                        Ok(HookOutput::additional_context(
                            HookEvent::UserPromptSubmit,
                            "today is Friday",
                        ))
                    }
                }))
                .build(),
        )
        .build();

    let (_client, mut remote, request) = client_with(options, json!({})).await;
    let hook_id = request["hooks"]["UserPromptSubmit"][0]["hookCallbackIds"][0]
        .as_str()
        .unwrap()
        .to_string();

    remote
        .request(
            "agent-1",
            json!({"subtype": "hook_callback", "callback_id": hook_id,
                   "input": {"hook_event_name": "UserPromptSubmit", "prompt": "hi"}}),
        )
        .await;
    let response = remote.expect_control_response().await;
    assert_eq!(
        response["response"]["hookSpecificOutput"]["additionalContext"],
        "today is Friday"
    );
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);

    remote
        .request(
            "agent-2",
            json!({"subtype": "can_use_tool", "tool_name": "Bash", "input": {"command": "ls"}}),
        )
        .await;
    let response = remote.expect_control_response().await;
    assert_eq!(response["response"]["behavior"], "deny");
}

#[tokio::test]
async fn test_failed_handshake_returns_error() {
    let (transport, mut remote) = scripted();
    let (client, ()) = tokio::join!(
        ClaudeSDKClient::from_transport(transport, ClaudeAgentOptions::default()),
        async {
            let (id, _) = remote.expect_control_request("initialize").await;
            remote.respond_error(&id, "unsupported client").await;
        }
    );

    match client {
        Err(ClaudeError::ControlRequest { subtype, message }) => {
            assert_eq!(subtype, "initialize");
            assert_eq!(message, "unsupported client");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("handshake should fail"),
    }
}

#[tokio::test]
async fn test_invalid_options_rejected_before_connecting() {
    let (transport, mut remote) = scripted();
    let options = ClaudeAgentOptions::builder()
        .can_use_tool(PermissionManager::callback(|_, _, _| async {
            Ok(PermissionResult::allow())
        }))
        .permission_prompt_tool_name("mcp__auth__prompt")
        .build();

    let err = ClaudeSDKClient::from_transport(transport, options)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClaudeError::InvalidConfig(_)));
    remote
        .assert_silent(std::time::Duration::from_millis(20))
        .await;
}

#[tokio::test]
async fn test_close_ends_session() {
    let (client, mut remote, _) = client_with(ClaudeAgentOptions::default(), json!({})).await;

    client.close().await.unwrap();

    assert!(client.connection().is_closed());
    assert!(client.next_message().await.is_none());
    let err = client.send_message("late").await.unwrap_err();
    assert!(err.is_connection_closed());
    remote
        .assert_silent(std::time::Duration::from_millis(20))
        .await;
}
