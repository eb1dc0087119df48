//! End-to-end tests for the stdio MCP server
//!
//! Each test drives a real MCP session over an in-memory duplex pipe: the
//! client handshake first, then newline-delimited JSON-RPC requests.

use hooks_mcp::config::HooksMcpConfig;
use hooks_mcp::engine::command_executor::CommandExecutor;
use hooks_mcp::server::{serve, McpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;

const INVALID_PARAMS: i64 = -32602;

const CONFIG: &str = r#"
server_name: "DemoTools"
server_description: "Demo project tools"
actions:
  - name: "echo_message"
    description: "Echo a message"
    command: "echo $MESSAGE"
    parameters:
      - name: "MESSAGE"
        type: "insecure_string"
        description: "Message to echo"
  - name: "show_file"
    description: "Print a project file"
    command: "cat $FILE"
    parameters:
      - name: "FILE"
        type: "project_file_path"
        default: "README.md"
  - name: "whoami"
    description: "Show the configured user"
    command: "echo $DEPLOY_USER"
    parameters:
      - name: "DEPLOY_USER"
        type: "required_env_var"
        description: "Deployment user"
  - name: "fail"
    description: "Always fails"
    command: "sh -c 'echo oops >&2; exit 3'"
prompts:
  - name: "review"
    description: "Review checklist"
    prompt-file: "prompts/review.md"
  - name: "explain"
    description: "Explain a file"
    prompt: "Explain {{file}} briefly."
    arguments:
      - name: "file"
        description: "File to explain"
        required: true
get_prompt_tool_filter:
  - "review"
"#;

struct Fixture {
    _dir: TempDir,
    server: McpServer,
}

fn fixture_with(config_text: &str, env: &[(&str, &str)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("prompts")).unwrap();
    fs::write(root.join("prompts/review.md"), "Look for missing tests.\n").unwrap();
    fs::write(root.join("README.md"), "demo readme\n").unwrap();

    let config = HooksMcpConfig::from_yaml_str(config_text, &root).unwrap();
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let executor = CommandExecutor::with_env(&root, Arc::new(env));
    Fixture {
        _dir: dir,
        server: McpServer::new(config, executor),
    }
}

fn fixture() -> Fixture {
    fixture_with(CONFIG, &[("DEPLOY_USER", "ci-bot")])
}

/// Client side of a running session
struct Session {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    next_id: u64,
    server: JoinHandle<hooks_mcp::Result<()>>,
    initialize: Value,
}

impl Session {
    async fn start(server: &McpServer) -> Self {
        let (client, server_end) = tokio::io::duplex(64 * 1024);
        let (server_reader, server_writer) = tokio::io::split(server_end);
        let handle = tokio::spawn(serve(server.clone(), server_reader, server_writer));

        let (client_reader, client_writer) = tokio::io::split(client);
        let mut session = Session {
            writer: client_writer,
            lines: BufReader::new(client_reader).lines(),
            next_id: 0,
            server: handle,
            initialize: Value::Null,
        };

        session.initialize = session
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "0"},
                }),
            )
            .await;
        session
            .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        session
    }

    async fn send(&mut self, message: Value) {
        self.writer
            .write_all(format!("{message}\n").as_bytes())
            .await
            .unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Send a request and wait for the response with the same id
    async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;

        loop {
            let line = tokio::time::timeout(Duration::from_secs(30), self.lines.next_line())
                .await
                .expect("no response within 30s")
                .unwrap()
                .expect("server closed the stream");
            let message: Value = serde_json::from_str(&line).unwrap();
            if message["id"] == id {
                return message;
            }
        }
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> (bool, String) {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let result = &response["result"];
        (
            result["isError"].as_bool().unwrap_or(false),
            result["content"][0]["text"].as_str().unwrap().to_string(),
        )
    }

    /// Close the client side; the server must then shut down cleanly
    async fn close(mut self) {
        self.writer.shutdown().await.unwrap();
        drop(self.writer);
        drop(self.lines);
        tokio::time::timeout(Duration::from_secs(30), self.server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

fn tool<'a>(tools: &'a [Value], name: &str) -> &'a Value {
    tools
        .iter()
        .find(|t| t["name"] == name)
        .unwrap_or_else(|| panic!("tool {name} not listed"))
}

#[tokio::test]
async fn test_initialize_then_list() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;

    let init = &session.initialize["result"];
    assert_eq!(init["serverInfo"]["name"], "DemoTools");
    assert_eq!(init["instructions"], "Demo project tools");
    assert!(init["capabilities"]["tools"].is_object());
    assert!(init["capabilities"]["prompts"].is_object());

    let response = session.request("tools/list", json!({})).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["echo_message", "show_file", "whoami", "fail", "get_prompt"]
    );
    session.close().await;
}

#[tokio::test]
async fn test_tool_schemas() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;
    let response = session.request("tools/list", json!({})).await;
    let tools = response["result"]["tools"].as_array().unwrap().clone();

    let echo = tool(&tools, "echo_message");
    assert_eq!(echo["inputSchema"]["required"], json!(["MESSAGE"]));
    assert_eq!(
        echo["inputSchema"]["properties"]["MESSAGE"]["description"],
        "Message to echo"
    );

    // Defaulted parameters are optional
    let show = tool(&tools, "show_file");
    assert_eq!(show["inputSchema"]["required"], json!([]));

    // Env-sourced parameters are hidden from clients
    let whoami = tool(&tools, "whoami");
    assert_eq!(whoami["inputSchema"]["properties"], json!({}));

    let prompt_tool = tool(&tools, "get_prompt");
    assert_eq!(
        prompt_tool["inputSchema"]["properties"]["prompt_name"]["enum"],
        json!(["review"])
    );
    let description = prompt_tool["description"].as_str().unwrap();
    assert!(description.contains("- review: Review checklist"));
    assert!(!description.contains("explain"));
    session.close().await;
}

#[tokio::test]
async fn test_call_action() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;

    let (is_error, text) = session
        .call_tool("echo_message", json!({"MESSAGE": "hi; rm -rf /"}))
        .await;
    assert!(!is_error, "{text}");
    assert_eq!(
        text,
        "Command executed: echo $MESSAGE\nExit code: 0\nSTDOUT:\nhi; rm -rf /\n"
    );

    let (is_error, text) = session.call_tool("show_file", json!({})).await;
    assert!(!is_error, "{text}");
    assert!(text.contains("STDOUT:\ndemo readme\n"));

    let (is_error, text) = session.call_tool("whoami", json!({})).await;
    assert!(!is_error, "{text}");
    assert!(text.contains("ci-bot"));
    session.close().await;
}

#[tokio::test]
async fn test_nonzero_exit_is_not_an_error_result() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;
    let (is_error, text) = session.call_tool("fail", json!({})).await;
    assert!(!is_error);
    assert!(text.contains("Exit code: 3\n"));
    assert!(text.contains("STDERR:\noops\n"));
    assert!(!text.contains("STDOUT:"));
    session.close().await;
}

#[tokio::test]
async fn test_failed_invocations_are_error_results() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;

    let (is_error, text) = session
        .call_tool("show_file", json!({"FILE": "../../etc/passwd"}))
        .await;
    assert!(is_error);
    assert!(text.starts_with("HooksMCP Error: "), "{text}");
    assert!(text.contains("../../etc/passwd"));

    let (is_error, text) = session.call_tool("echo_message", json!({})).await;
    assert!(is_error);
    assert!(text.contains("MESSAGE"), "{text}");

    let (is_error, text) = session.call_tool("nope", json!({})).await;
    assert!(is_error);
    assert!(text.contains("Action 'nope' not found"));

    // The session keeps serving after failures
    let response = session.request("ping", json!({})).await;
    assert!(response.get("result").is_some(), "{response}");
    session.close().await;
}

#[tokio::test]
async fn test_missing_env_var_at_call_time() {
    let fx = fixture_with(CONFIG, &[]);
    let mut session = Session::start(&fx.server).await;
    let (is_error, text) = session.call_tool("whoami", json!({})).await;
    assert!(is_error);
    assert!(text.contains("DEPLOY_USER"), "{text}");
    session.close().await;
}

#[tokio::test]
async fn test_get_prompt_tool() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;

    let (is_error, text) = session
        .call_tool("get_prompt", json!({"prompt_name": "review"}))
        .await;
    assert!(!is_error);
    assert_eq!(text, "Look for missing tests.\n");

    let (is_error, text) = session
        .call_tool("get_prompt", json!({"prompt_name": "explain"}))
        .await;
    assert!(is_error);
    assert!(text.contains("Available prompts: review"), "{text}");

    let (is_error, text) = session.call_tool("get_prompt", json!({})).await;
    assert!(is_error);
    assert!(text.contains("prompt_name"));
    session.close().await;
}

#[tokio::test]
async fn test_prompts_list_and_get() {
    let fx = fixture();
    let mut session = Session::start(&fx.server).await;

    let response = session.request("prompts/list", json!({})).await;
    let prompts = response["result"]["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1]["name"], "explain");
    assert_eq!(prompts[1]["arguments"][0]["name"], "file");
    assert_eq!(prompts[1]["arguments"][0]["required"], true);

    let response = session
        .request(
            "prompts/get",
            json!({"name": "explain", "arguments": {"file": "main.rs"}}),
        )
        .await;
    let result = &response["result"];
    assert_eq!(result["description"], "Explain a file");
    assert_eq!(result["messages"][0]["role"], "user");
    assert_eq!(
        result["messages"][0]["content"]["text"],
        "Explain main.rs briefly."
    );

    let response = session
        .request("prompts/get", json!({"name": "explain"}))
        .await;
    assert_eq!(response["error"]["code"], INVALID_PARAMS);

    let response = session
        .request("prompts/get", json!({"name": "missing"}))
        .await;
    assert_eq!(response["error"]["code"], INVALID_PARAMS);
    session.close().await;
}

#[tokio::test]
async fn test_tools_only_config_advertises_no_prompts() {
    let config = r#"
actions:
  - name: "hello"
    description: "Say hello"
    command: "echo hello"
"#;
    let fx = fixture_with(config, &[]);
    let session = Session::start(&fx.server).await;
    let capabilities = &session.initialize["result"]["capabilities"];
    assert!(capabilities["tools"].is_object());
    assert!(capabilities["prompts"].is_null());
    session.close().await;
}

#[tokio::test]
async fn test_disabled_prompt_tool() {
    let fx = fixture();
    let server = fx.server.clone().without_prompt_tool();
    let mut session = Session::start(&server).await;

    let response = session.request("tools/list", json!({})).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().all(|t| t["name"] != "get_prompt"));

    let (is_error, text) = session
        .call_tool("get_prompt", json!({"prompt_name": "review"}))
        .await;
    assert!(is_error);
    assert!(text.contains("Action 'get_prompt' not found"));

    // prompts/list is still served
    let response = session.request("prompts/list", json!({})).await;
    assert_eq!(response["result"]["prompts"].as_array().unwrap().len(), 2);
    session.close().await;
}

#[tokio::test]
async fn test_action_named_get_prompt_takes_precedence() {
    let config = r#"
actions:
  - name: "get_prompt"
    description: "Project-specific prompt fetcher"
    command: "echo from-action"
prompts:
  - name: "p"
    description: "P"
    prompt: "prompt text"
"#;
    let fx = fixture_with(config, &[]);
    let mut session = Session::start(&fx.server).await;

    let response = session.request("tools/list", json!({})).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["description"], "Project-specific prompt fetcher");

    let (is_error, text) = session
        .call_tool("get_prompt", json!({"prompt_name": "p"}))
        .await;
    assert!(!is_error);
    assert!(text.contains("from-action"));
    session.close().await;
}
