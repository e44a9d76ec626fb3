//! Tests for `JsonLineCodec` driven through `FramedRead`
//!
//! `tokio_test::io::Builder` delivers the bytes in the chunks given, so these
//! tests also cover objects split across reads.

use claude_agent_protocol::JsonLineCodec;
use futures::StreamExt;
use serde_json::{Value, json};
use tokio_util::codec::FramedRead;

async fn collect(reader: tokio_test::io::Mock, max: usize) -> Vec<Result<Value, String>> {
    FramedRead::new(reader, JsonLineCodec::new(max))
        .map(|frame| match frame {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => panic!("decoder failed: {e}"),
        })
        .collect()
        .await
}

#[tokio::test]
async fn test_one_object_per_line() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"system\",\"subtype\":\"init\"}\n{\"type\":\"result\"}\n")
        .build();

    let frames = collect(reader, 1024).await;
    assert_eq!(
        frames,
        vec![
            Ok(json!({"type": "system", "subtype": "init"})),
            Ok(json!({"type": "result"})),
        ]
    );
}

#[tokio::test]
async fn test_object_split_across_reads() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"assis")
        .read(b"tant\",\"n\":1}\n{\"type\"")
        .read(b":\"user\"}\n")
        .build();

    let frames = collect(reader, 1024).await;
    assert_eq!(
        frames,
        vec![
            Ok(json!({"type": "assistant", "n": 1})),
            Ok(json!({"type": "user"})),
        ]
    );
}

#[tokio::test]
async fn test_object_split_across_lines() {
    // Pieces of one object on separate lines are joined without a separator
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\n")
        .read(b"  \"result\",\n")
        .read(b"\"num_turns\": 2}\n")
        .build();

    let frames = collect(reader, 1024).await;
    assert_eq!(frames, vec![Ok(json!({"type": "result", "num_turns": 2}))]);
}

#[tokio::test]
async fn test_blank_lines_and_whitespace_ignored() {
    let reader = tokio_test::io::Builder::new()
        .read(b"\n   \n\t{\"a\":1}  \r\n\n")
        .build();

    assert_eq!(collect(reader, 1024).await, vec![Ok(json!({"a": 1}))]);
}

#[tokio::test]
async fn test_oversize_object_then_resume() {
    let big = format!("{{\"blob\":\"{}\"}}\n", "x".repeat(200));
    let reader = tokio_test::io::Builder::new()
        .read(big.as_bytes())
        .read(b"{\"ok\":true}\n")
        .build();

    let frames = collect(reader, 64).await;
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[0],
        Err("JSON decode error: JSON message exceeded maximum buffer size of 64 bytes".into())
    );
    assert_eq!(frames[1], Ok(json!({"ok": true})));
}

#[tokio::test]
async fn test_oversize_accumulation_across_lines() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"a\":\n")
        .read(b"\"0123456789012345678901234567890123456789\"\n")
        .read(b"{}\n")
        .build();

    let frames = collect(reader, 32).await;
    assert_eq!(frames.len(), 2);
    assert!(frames[0].is_err());
    assert_eq!(frames[1], Ok(json!({})));
}

#[tokio::test]
async fn test_truncated_object_at_eof() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"user\"}\n{\"type\":")
        .build();

    let frames = collect(reader, 1024).await;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], Ok(json!({"type": "user"})));
    assert!(frames[1].as_ref().unwrap_err().contains("stream ended inside a JSON message"));
}

#[tokio::test]
async fn test_final_line_without_newline() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"result\"}")
        .build();

    assert_eq!(collect(reader, 1024).await, vec![Ok(json!({"type": "result"}))]);
}

#[test]
fn test_push_line_api() {
    let mut codec = JsonLineCodec::new(1024);
    assert_eq!(codec.max_buffer_size(), 1024);
    assert!(codec.push_line("[1,").is_none());
    assert!(codec.buffered_len() > 0);
    assert_eq!(codec.push_line("2]").unwrap().unwrap(), json!([1, 2]));
    assert_eq!(codec.buffered_len(), 0);
}
