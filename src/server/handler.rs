//! MCP request handling on top of rmcp's `ServerHandler`
//!
//! Every per-invocation failure is turned into a structured result here.
//! Nothing a client sends can stop the server.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData as McpError, GetPromptRequestParams,
    GetPromptResult, Implementation, ListPromptsResult, ListToolsResult, PaginatedRequestParams,
    Prompt, PromptMessage, PromptMessageRole, ProtocolVersion, ServerCapabilities, ServerInfo,
    Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::tools::{format_execution_result, prompt_definitions, tool_definitions};
use crate::config::actions::Action;
use crate::config::types::{HooksMcpConfig, GET_PROMPT_TOOL};
use crate::engine::command_executor::{CommandExecutor, ExecutionError};
use crate::engine::prompts::{prompt_content, render_prompt, PromptError};

const ERROR_PREFIX: &str = "HooksMCP Error";

/// Serves one configuration over MCP
#[derive(Clone)]
pub struct McpServer {
    config: Arc<HooksMcpConfig>,
    executor: CommandExecutor,
    prompt_tool_enabled: bool,
}

impl McpServer {
    pub fn new(config: HooksMcpConfig, executor: CommandExecutor) -> Self {
        Self {
            config: Arc::new(config),
            executor,
            prompt_tool_enabled: true,
        }
    }

    /// Never expose the get_prompt tool
    pub fn without_prompt_tool(mut self) -> Self {
        self.prompt_tool_enabled = false;
        self
    }

    pub fn config(&self) -> &HooksMcpConfig {
        &self.config
    }

    pub fn tool_list(&self) -> Vec<Tool> {
        tool_definitions(&self.config, self.prompt_tool_enabled)
    }

    pub fn prompt_list(&self) -> Vec<Prompt> {
        prompt_definitions(&self.config)
    }

    /// Run a tool; failures come back as `isError` results
    pub async fn run_tool(&self, name: &str, arguments: Map<String, Value>) -> CallToolResult {
        if let Some(action) = self.config.action(name) {
            return self.run_action(action.clone(), arguments).await;
        }
        if name == GET_PROMPT_TOOL && self.prompt_tool_enabled {
            return self.call_prompt_tool(&arguments);
        }
        warn!("Unknown tool requested: {}", name);
        error_result(format!("Action '{name}' not found"))
    }

    async fn run_action(&self, action: Action, arguments: Map<String, Value>) -> CallToolResult {
        let executor = self.executor.clone();
        let task_action = action.clone();
        // A panic inside the invocation is reported, not propagated
        let task =
            tokio::spawn(async move { executor.execute_action(&task_action, &arguments).await });

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!("Action '{}' task failed: {}", action.name, join_error);
                Err(ExecutionError::Unexpected {
                    action: action.name.clone(),
                    message: join_error.to_string(),
                })
            }
        };

        match outcome {
            Ok(result) => CallToolResult::success(vec![Content::text(format_execution_result(
                &action, &result,
            ))]),
            Err(err) => {
                if err.is_security_rejection() {
                    warn!("Security rejection in action '{}': {}", err.action(), err);
                } else {
                    warn!("Action '{}' failed: {}", err.action(), err);
                }
                error_result(err.to_string())
            }
        }
    }

    fn call_prompt_tool(&self, arguments: &Map<String, Value>) -> CallToolResult {
        let name = match arguments.get("prompt_name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return error_result(format!(
                    "'prompt_name' argument is required for {GET_PROMPT_TOOL} tool"
                ))
            }
        };

        match self.exposed_prompt_content(name) {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(err @ PromptError::NotExposed(_)) => {
                let available: Vec<&str> = self
                    .config
                    .exposed_prompts()
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect();
                error_result(format!("{err}. Available prompts: {}", available.join(", ")))
            }
            Err(err) => error_result(err.to_string()),
        }
    }

    fn exposed_prompt_content(&self, name: &str) -> Result<String, PromptError> {
        let prompt = self
            .config
            .prompt(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;
        if !self.config.exposed_prompts().iter().any(|p| p.name == name) {
            return Err(PromptError::NotExposed(name.to_string()));
        }
        prompt_content(prompt, self.config.config_dir())
    }

    /// Render a prompt for `prompts/get`
    ///
    /// Unknown prompts and missing required arguments are invalid params.
    pub fn prompt_result(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<GetPromptResult, McpError> {
        let prompt = self.config.prompt(name).ok_or_else(|| {
            McpError::invalid_params(PromptError::NotFound(name.to_string()).to_string(), None)
        })?;

        let text = render_prompt(prompt, self.config.config_dir(), arguments).map_err(|err| {
            match err {
                PromptError::MissingArgument { .. } => McpError::invalid_params(err.to_string(), None),
                other => {
                    error!("Failed to render prompt '{}': {}", name, other);
                    McpError::internal_error(other.to_string(), None)
                }
            }
        })?;

        Ok(GetPromptResult {
            description: Some(prompt.description.clone()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

fn error_result(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("{ERROR_PREFIX}: {message}"))])
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        // Prompts are only advertised when the config has some
        let capabilities = if self.config.prompts.is_empty() {
            ServerCapabilities::builder().enable_tools().build()
        } else {
            ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build()
        };

        ServerInfo {
            capabilities,
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: self.config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(self.config.server_description.clone()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tool_list())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            debug!("tools/call {}", request.name);
            Ok(self
                .run_tool(&request.name, request.arguments.unwrap_or_default())
                .await)
        }
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListPromptsResult::with_all_items(self.prompt_list())))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        std::future::ready(
            self.prompt_result(&request.name, &request.arguments.unwrap_or_default()),
        )
    }
}
