//! Tool and prompt definitions advertised to clients

use rmcp::model::{JsonObject, Prompt as McpPrompt, PromptArgument as McpPromptArgument, Tool};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::config::actions::Action;
use crate::config::prompts::Prompt;
use crate::config::types::{HooksMcpConfig, GET_PROMPT_TOOL};
use crate::engine::command_executor::ExecutionResult;

/// Tool definition for one action
///
/// Env-sourced parameters are never client-controlled and stay out of the
/// schema. Parameters without a default are required.
pub fn action_tool(action: &Action) -> Tool {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in action.client_parameters() {
        properties.insert(
            param.name.clone(),
            json!({
                "type": "string",
                "description": param.display_description(),
            }),
        );
        if param.default.is_none() {
            required.push(Value::String(param.name.clone()));
        }
    }

    Tool::new(
        action.name.clone(),
        action.description.clone(),
        object_schema(properties, required),
    )
}

fn object_schema(properties: Map<String, Value>, required: Vec<Value>) -> Arc<JsonObject> {
    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), Value::Array(required));
    Arc::new(schema)
}

/// The get_prompt tool, or `None` when no prompt would be reachable
pub fn prompt_tool(exposed: &[&Prompt]) -> Option<Tool> {
    if exposed.is_empty() {
        return None;
    }

    let listing = exposed
        .iter()
        .map(|p| format!("- {}: {}", p.name, p.description))
        .collect::<Vec<_>>()
        .join("\n");
    let names: Vec<&str> = exposed.iter().map(|p| p.name.as_str()).collect();

    let mut properties = Map::new();
    properties.insert(
        "prompt_name".to_string(),
        json!({
            "type": "string",
            "description": "The name of the prompt to retrieve",
            "enum": names,
        }),
    );

    Some(Tool::new(
        GET_PROMPT_TOOL,
        format!("Get a prompt designed for this codebase. The prompts include:\n{listing}"),
        object_schema(properties, vec![json!("prompt_name")]),
    ))
}

/// Every tool the server exposes, actions first
///
/// An action named `get_prompt` takes precedence over the prompt tool.
pub fn tool_definitions(config: &HooksMcpConfig, prompt_tool_enabled: bool) -> Vec<Tool> {
    let mut tools: Vec<Tool> = config.actions.iter().map(action_tool).collect();
    if prompt_tool_enabled && config.action(GET_PROMPT_TOOL).is_none() {
        tools.extend(prompt_tool(&config.exposed_prompts()));
    }
    tools
}

pub fn prompt_definitions(config: &HooksMcpConfig) -> Vec<McpPrompt> {
    config
        .prompts
        .iter()
        .map(|prompt| {
            let arguments: Vec<McpPromptArgument> = prompt
                .arguments
                .iter()
                .map(|arg| McpPromptArgument {
                    name: arg.name.clone(),
                    title: None,
                    description: arg.description.clone(),
                    required: Some(arg.required),
                })
                .collect();
            McpPrompt::new(
                prompt.name.clone(),
                Some(prompt.description.clone()),
                (!arguments.is_empty()).then_some(arguments),
            )
        })
        .collect()
}

/// Text returned to the client after an action ran
pub fn format_execution_result(action: &Action, result: &ExecutionResult) -> String {
    let mut output = format!(
        "Command executed: {}\nExit code: {}\n",
        action.command, result.exit_code
    );
    if !result.stdout.is_empty() {
        output.push_str(&format!("STDOUT:\n{}\n", result.stdout));
    }
    if !result.stderr.is_empty() {
        output.push_str(&format!("STDERR:\n{}\n", result.stderr));
    }
    output
}
