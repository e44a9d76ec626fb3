//! Integration tests for `Connection`
//!
//! The scripted transport plays the agent: it feeds objects to the reader loop
//! and captures every line the engine writes.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use claude_agent_protocol::control::OutboundRequest;
use claude_agent_protocol::{
    ClaudeAgentOptions, ClaudeError, Connection, ConnectionMode, ConnectionState, HookEvent,
    HookManager, HookMatcherBuilder, HookOutput, Message, SessionId,
};
use common::{active_connection, assistant, init_logging, result, scripted};
use serde_json::json;

#[tokio::test]
async fn test_messages_keep_order_and_skip_control_envelopes() {
    init_logging();
    let (connection, remote) = active_connection(&ClaudeAgentOptions::default()).await;

    remote.send(assistant("one")).await;
    remote.respond_success("req_99_deadbeef", json!({})).await;
    remote
        .send(json!({"type": "system", "subtype": "init", "tools": ["Bash"]}))
        .await;
    remote
        .send(json!({"type": "control_cancel_request", "request_id": "req_1_x"}))
        .await;
    remote.send(assistant("two")).await;
    remote.send(result()).await;

    let mut seen = Vec::new();
    while let Some(message) = connection.next_message().await {
        let message = message.unwrap();
        let done = message.is_result();
        seen.push(message);
        if done {
            break;
        }
    }

    assert_eq!(seen.len(), 4);
    assert!(matches!(&seen[0], Message::Assistant(m) if m.text() == "one"));
    assert!(matches!(&seen[1], Message::System(m) if m.subtype == "init"));
    assert!(matches!(&seen[2], Message::Assistant(m) if m.text() == "two"));
    assert!(seen[3].is_result());
}

#[tokio::test]
async fn test_concurrent_requests_get_their_own_responses() {
    init_logging();
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let remote_side = async {
        let first = remote.next_written().await;
        let second = remote.next_written().await;
        // Answer in reverse order, echoing the subtype
        for envelope in [second, first] {
            let id = envelope["request_id"].as_str().unwrap();
            let subtype = envelope["request"]["subtype"].clone();
            remote.respond_success(id, json!({"echo": subtype})).await;
        }
    };

    let (interrupt, model, ()) = tokio::join!(
        connection.send_control_request(OutboundRequest::Interrupt, None),
        connection.send_control_request(
            OutboundRequest::SetModel {
                model: Some("claude-opus-4".into())
            },
            None
        ),
        remote_side
    );

    assert_eq!(interrupt.unwrap(), json!({"echo": "interrupt"}));
    assert_eq!(model.unwrap(), json!({"echo": "set_model"}));
    assert_eq!(connection.pending_requests(), 0);
}

#[tokio::test]
async fn test_request_ids_carry_counter_and_random_suffix() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (_, (id, _)) = tokio::join!(
        connection.send_control_request(OutboundRequest::Interrupt, Some(Duration::from_millis(50))),
        remote.expect_control_request("interrupt")
    );

    let parts: Vec<&str> = id.split('_').collect();
    assert_eq!(parts.len(), 3, "unexpected id {id}");
    assert_eq!(parts[0], "req");
    // initialize took 1
    assert_eq!(parts[1], "2");
    assert_eq!(parts[2].len(), 8);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_timed_out_request_is_deregistered_and_late_response_dropped() {
    init_logging();
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (outcome, (late_id, _)) = tokio::join!(
        connection.send_control_request(OutboundRequest::Interrupt, Some(Duration::from_millis(50))),
        remote.expect_control_request("interrupt")
    );
    let err = outcome.unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(connection.pending_requests(), 0);

    remote.respond_success(&late_id, json!({"late": true})).await;
    remote.send(assistant("after")).await;

    let next = connection.next_message().await.unwrap().unwrap();
    assert!(matches!(next, Message::Assistant(m) if m.text() == "after"));

    // The connection still correlates new requests
    let (ok, ()) = tokio::join!(connection.interrupt(), async {
        let (id, _) = remote.expect_control_request("interrupt").await;
        remote.respond_success(&id, json!({})).await;
    });
    ok.unwrap();
}

#[tokio::test]
async fn test_error_response_names_the_request() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (outcome, ()) = tokio::join!(connection.set_model(Some("nope".into())), async {
        let (id, request) = remote.expect_control_request("set_model").await;
        assert_eq!(request["model"], "nope");
        remote.respond_error(&id, "unknown model").await;
    });

    match outcome.unwrap_err() {
        ClaudeError::ControlRequest { subtype, message } => {
            assert_eq!(subtype, "set_model");
            assert_eq!(message, "unknown model");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_close_releases_every_pending_request() {
    init_logging();
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;
    let connection = Arc::new(connection);

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let connection = Arc::clone(&connection);
            tokio::spawn(async move { connection.interrupt().await })
        })
        .collect();
    for _ in 0..3 {
        remote.expect_control_request("interrupt").await;
    }
    assert_eq!(connection.pending_requests(), 3);

    connection.close().await.unwrap();

    for waiter in waiters {
        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_connection_closed(), "{err}");
    }
    assert_eq!(connection.pending_requests(), 0);
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.next_message().await.is_none());

    // Closed connections refuse new work without writing
    assert!(connection.interrupt().await.unwrap_err().is_connection_closed());
    remote.assert_silent(Duration::from_millis(50)).await;

    // Second close is a no-op
    connection.close().await.unwrap();
}

#[tokio::test]
async fn test_end_of_stream_fails_pending_requests() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (outcome, ()) = tokio::join!(connection.interrupt(), async {
        remote.expect_control_request("interrupt").await;
        remote.hang_up();
    });

    assert!(outcome.unwrap_err().is_connection_closed());
    assert!(connection.next_message().await.is_none());
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_transport_failure_is_fatal() {
    init_logging();
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (outcome, ()) = tokio::join!(connection.interrupt(), async {
        remote.expect_control_request("interrupt").await;
        remote.send_err(ClaudeError::transport("pipe broke")).await;
    });

    let err = outcome.unwrap_err();
    assert!(matches!(&err, ClaudeError::Connection(msg) if msg.contains("pipe broke")), "{err}");

    let item = connection.next_message().await.unwrap();
    assert!(matches!(item, Err(ClaudeError::Transport(_))));
    assert!(connection.next_message().await.is_none());
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_framing_errors_are_delivered_and_reading_continues() {
    let (connection, remote) = active_connection(&ClaudeAgentOptions::default()).await;

    remote
        .send_err(ClaudeError::json_decode(
            "JSON message exceeded maximum buffer size of 16 bytes",
        ))
        .await;
    remote.send(assistant("still here")).await;

    let first = connection.next_message().await.unwrap().unwrap_err();
    assert!(first.is_recoverable());
    let second = connection.next_message().await.unwrap().unwrap();
    assert!(matches!(second, Message::Assistant(m) if m.text() == "still here"));
    assert_eq!(connection.state(), ConnectionState::Active);
}

#[tokio::test]
async fn test_unclassifiable_message_is_reported_without_closing() {
    let (connection, remote) = active_connection(&ClaudeAgentOptions::default()).await;

    remote.send(json!({"type": "telemetry", "n": 1})).await;
    remote.send(json!({"no_type": true})).await;
    remote.send(result()).await;

    let err = connection.next_message().await.unwrap().unwrap_err();
    assert!(matches!(err, ClaudeError::MessageParse { .. }));
    let err = connection.next_message().await.unwrap().unwrap_err();
    assert!(err.to_string().contains("missing 'type' field"));
    assert!(connection.next_message().await.unwrap().unwrap().is_result());
}

#[tokio::test]
async fn test_one_shot_mode_rejects_control_requests() {
    let (transport, mut remote) = scripted();
    let connection = Connection::new(
        transport,
        ConnectionMode::OneShot,
        &ClaudeAgentOptions::default(),
    )
    .unwrap();

    connection.connect().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Active);
    assert_eq!(connection.initialize().await.unwrap(), None);

    let err = connection.interrupt().await.unwrap_err();
    assert!(matches!(err, ClaudeError::ControlProtocol(_)), "{err}");
    remote.assert_silent(Duration::from_millis(50)).await;

    remote.send(assistant("hi")).await;
    remote.send(result()).await;
    remote.hang_up();

    let mut count = 0;
    while let Some(message) = connection.next_message().await {
        message.unwrap();
        count += 1;
    }
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_initialize_sends_hook_table_and_keeps_server_info() {
    let hook = HookManager::callback(|_input, _id, _ctx| async { Ok(HookOutput::default()) });
    let options = ClaudeAgentOptions::builder()
        .add_hook(
            HookEvent::PreToolUse,
            HookMatcherBuilder::new(Some("Bash"))
                .add_hook(hook)
                .timeout(30.0)
                .build(),
        )
        .build();

    let (transport, mut remote) = scripted();
    let connection = Connection::new(transport, ConnectionMode::Streaming, &options).unwrap();
    connection.connect().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Initializing);

    let info = json!({"commands": [], "output_style": "default"});
    let (init, request) = tokio::join!(connection.initialize(), remote.handshake(info.clone()));

    assert_eq!(init.unwrap(), Some(info.clone()));
    assert_eq!(connection.server_info(), Some(info));
    assert_eq!(connection.state(), ConnectionState::Active);
    assert_eq!(
        request["hooks"],
        json!({"PreToolUse": [{"matcher": "Bash", "hookCallbackIds": ["hook_0"], "timeout": 30.0}]})
    );
}

#[tokio::test]
async fn test_initialize_without_hooks_sends_no_table() {
    let (transport, mut remote) = scripted();
    let connection = Connection::new(
        transport,
        ConnectionMode::Streaming,
        &ClaudeAgentOptions::default(),
    )
    .unwrap();
    connection.connect().await.unwrap();

    let (init, request) = tokio::join!(connection.initialize(), remote.handshake(json!({})));
    init.unwrap();
    assert!(request.get("hooks").is_none() || request["hooks"].is_null());
}

#[tokio::test]
async fn test_initialize_times_out() {
    let options = ClaudeAgentOptions::builder()
        .initialize_timeout(Duration::from_millis(50))
        .build();
    let (transport, mut remote) = scripted();
    let connection = Connection::new(transport, ConnectionMode::Streaming, &options).unwrap();
    connection.connect().await.unwrap();

    let (init, _) = tokio::join!(
        connection.initialize(),
        remote.expect_control_request("initialize")
    );

    assert!(init.unwrap_err().is_timeout());
    assert_eq!(connection.pending_requests(), 0);
    assert_eq!(connection.server_info(), None);
    assert_eq!(connection.state(), ConnectionState::Initializing);
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let (connection, _remote) = active_connection(&ClaudeAgentOptions::default()).await;
    let err = connection.connect().await.unwrap_err();
    assert!(matches!(err, ClaudeError::ControlProtocol(_)));
}

#[tokio::test]
async fn test_first_result_signal_does_not_consume_messages() {
    let (connection, remote) = active_connection(&ClaudeAgentOptions::default()).await;

    assert!(!connection.wait_for_first_result(Duration::from_millis(20)).await);

    remote.send(assistant("answer")).await;
    remote.send(result()).await;

    assert!(connection.wait_for_first_result(Duration::from_secs(5)).await);
    assert!(connection.wait_for_first_result(Duration::from_millis(1)).await);

    assert!(matches!(
        connection.next_message().await.unwrap().unwrap(),
        Message::Assistant(_)
    ));
    assert!(connection.next_message().await.unwrap().unwrap().is_result());
}

#[tokio::test]
async fn test_user_messages_use_the_stream_json_shape() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    connection
        .send_user_message("hello", &SessionId::new("s-42"))
        .await
        .unwrap();

    assert_eq!(
        remote.next_written().await,
        json!({
            "type": "user",
            "message": {"role": "user", "content": "hello"},
            "parent_tool_use_id": null,
            "session_id": "s-42"
        })
    );
}

#[tokio::test]
async fn test_full_message_channel_stalls_the_reader() {
    let options = ClaudeAgentOptions::builder()
        .message_channel_capacity(1)
        .build();
    let (connection, mut remote) = active_connection(&options).await;
    let connection = Arc::new(connection);

    let pending = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.interrupt().await })
    };
    let (id, _) = remote.expect_control_request("interrupt").await;

    for text in ["one", "two", "three"] {
        remote.send(assistant(text)).await;
    }
    remote.respond_success(&id, json!({})).await;

    // "one" fills the channel, so the reader waits on "two" and never sees the response
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished());
    assert_eq!(connection.pending_requests(), 1);

    for expected in ["one", "two"] {
        let message = connection.next_message().await.unwrap().unwrap();
        assert!(matches!(message, Message::Assistant(m) if m.text() == expected));
    }

    tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("reader resumes once the consumer drains")
        .unwrap()
        .unwrap();
    let last = connection.next_message().await.unwrap().unwrap();
    assert!(matches!(last, Message::Assistant(m) if m.text() == "three"));
}

#[tokio::test]
async fn test_close_unblocks_a_stalled_reader() {
    let options = ClaudeAgentOptions::builder()
        .message_channel_capacity(1)
        .build();
    let (connection, remote) = active_connection(&options).await;

    for text in ["one", "two", "three"] {
        remote.send(assistant(text)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(1), connection.close())
        .await
        .expect("close does not wait for the consumer")
        .unwrap();
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.interrupt().await.unwrap_err().is_connection_closed());
}

#[tokio::test]
async fn test_irregular_response_subtype_still_resolves_the_request() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    let (outcome, ()) = tokio::join!(connection.interrupt(), async {
        let (id, _) = remote.expect_control_request("interrupt").await;
        remote
            .send(json!({
                "type": "control_response",
                "response": {"subtype": "ok", "request_id": id}
            }))
            .await;
    });

    outcome.unwrap();
    assert_eq!(connection.pending_requests(), 0);
}

#[tokio::test]
async fn test_malformed_inbound_request_gets_an_error_response() {
    let (connection, mut remote) = active_connection(&ClaudeAgentOptions::default()).await;

    remote
        .send(json!({"type": "control_request", "request_id": "agent-5"}))
        .await;
    let response = remote.expect_control_response().await;
    assert_eq!(response["subtype"], "error");
    assert_eq!(response["request_id"], "agent-5");
    assert!(
        response["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed control request")
    );

    // The connection keeps working
    remote.send(assistant("still here")).await;
    assert!(matches!(
        connection.next_message().await.unwrap().unwrap(),
        Message::Assistant(_)
    ));
}

#[tokio::test]
async fn test_zero_channel_capacity_is_rejected() {
    let (transport, _remote) = scripted();
    let options = ClaudeAgentOptions::builder()
        .message_channel_capacity(0)
        .build();

    match Connection::new(transport, ConnectionMode::Streaming, &options) {
        Err(ClaudeError::InvalidConfig(msg)) => assert!(msg.contains("message_channel_capacity")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("zero capacity must be rejected"),
    }
}
