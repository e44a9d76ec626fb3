//! Tests for in-process MCP servers

use claude_agent_protocol::mcp::{
    ArgumentsExt, JsonRpcResponse, MCP_PROTOCOL_VERSION, SdkMcpServer, SdkMcpTool, ToolResult,
    error_codes,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Deserialize, JsonSchema)]
#[allow(dead_code)]
struct GreetArgs {
    /// Who to greet
    name: String,
    /// Greeting to use
    greeting: Option<String>,
}

fn server() -> SdkMcpServer {
    SdkMcpServer::new("toolbox")
        .version("0.3.0")
        .tool(SdkMcpTool::new(
            "divide",
            "Divide a by b",
            json!({"type": "object", "required": ["a", "b"]}),
            |args| async move {
                let b = args.require_f64("b")?;
                if b == 0.0 {
                    return Ok(ToolResult::error("division by zero"));
                }
                Ok(ToolResult::text(format!("{}", args.require_f64("a")? / b)))
            },
        ))
        .tool(SdkMcpTool::with_schema::<GreetArgs, _, _>(
            "greet",
            "Greet someone",
            |args| async move {
                let greeting = args.str_or("greeting", "Hello");
                Ok(ToolResult::text(format!("{greeting}, {}!", args.require_str("name")?)))
            },
        ))
}

async fn call(server: &SdkMcpServer, message: Value) -> Value {
    server.handle_message(message).await.into_value()
}

#[tokio::test]
async fn test_initialize() {
    let response = call(
        &server(),
        json!({"jsonrpc": "2.0", "id": "init-1", "method": "initialize", "params": {}}),
    )
    .await;

    assert_eq!(
        response,
        json!({
            "jsonrpc": "2.0",
            "id": "init-1",
            "result": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "toolbox", "version": "0.3.0"}
            }
        })
    );
}

#[tokio::test]
async fn test_tools_list_in_registration_order() {
    let response = call(
        &server(),
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["divide", "greet"]);
    assert_eq!(tools[0]["description"], "Divide a by b");

    let schema = &tools[1]["inputSchema"];
    assert_eq!(schema["type"], "object");
    assert!(schema["properties"].get("name").is_some());
    assert_eq!(schema["required"], json!(["name"]));
}

#[tokio::test]
async fn test_tools_call_success_and_tool_reported_error() {
    let server = server();

    let ok = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
               "params": {"name": "divide", "arguments": {"a": 9, "b": 2}}}),
    )
    .await;
    assert_eq!(ok["result"]["content"][0]["text"], "4.5");
    assert!(ok["result"].get("isError").is_none());

    let flagged = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
               "params": {"name": "divide", "arguments": {"a": 1, "b": 0}}}),
    )
    .await;
    assert_eq!(flagged["result"]["isError"], true);

    let greeted = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
               "params": {"name": "greet", "arguments": {"name": "Ada"}}}),
    )
    .await;
    assert_eq!(greeted["result"]["content"][0]["text"], "Hello, Ada!");
}

#[tokio::test]
async fn test_handler_failure_is_internal_error() {
    let response = call(
        &server(),
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
               "params": {"name": "divide", "arguments": {"a": 1}}}),
    )
    .await;

    assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
    assert_eq!(response["error"]["message"], "missing required parameter: b");
}

#[tokio::test]
async fn test_unknown_tool_and_method() {
    let server = server();

    let tool = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "sqrt"}}),
    )
    .await;
    assert_eq!(tool["error"]["code"], error_codes::METHOD_NOT_FOUND);
    assert_eq!(tool["error"]["message"], "Tool 'sqrt' not found");

    let method = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"}),
    )
    .await;
    assert_eq!(method["error"]["code"], error_codes::METHOD_NOT_FOUND);
    assert_eq!(method["id"], 7);
}

#[tokio::test]
async fn test_invalid_params() {
    let server = server();

    let no_name = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call", "params": {}}),
    )
    .await;
    assert_eq!(no_name["error"]["code"], error_codes::INVALID_PARAMS);

    let bad_args = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call",
               "params": {"name": "divide", "arguments": [1, 2]}}),
    )
    .await;
    assert_eq!(bad_args["error"]["code"], error_codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_initialized_notification() {
    let response = server()
        .handle_message(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    assert_eq!(response, JsonRpcResponse::success(None, json!({})));
    assert_eq!(response.into_value(), json!({"jsonrpc": "2.0", "result": {}}));
}

#[tokio::test]
async fn test_not_a_request() {
    let response = call(&server(), json!({"id": 10, "params": {}})).await;
    assert_eq!(response["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(response["id"], 10);
}

#[test]
fn test_duplicate_tool_name_replaces() {
    let server = SdkMcpServer::new("dup")
        .tool(SdkMcpTool::new("t", "first", json!({}), |_| async {
            Ok(ToolResult::text("1"))
        }))
        .tool(SdkMcpTool::new("t", "second", json!({}), |_| async {
            Ok(ToolResult::text("2"))
        }));
    assert_eq!(server.tools().len(), 1);
    assert_eq!(server.tools()[0].description(), "second");
}
