use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::actions::{Action, ParameterKind};
use super::prompts::Prompt;
use crate::io::env::EnvLookup;

pub const DEFAULT_SERVER_NAME: &str = "HooksMCP";

pub const DEFAULT_SERVER_DESCRIPTION: &str =
    "Project-specific development tools and prompts exposed via MCP";

/// Name of the built-in tool that returns prompt text
pub const GET_PROMPT_TOOL: &str = "get_prompt";

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

fn default_server_description() -> String {
    DEFAULT_SERVER_DESCRIPTION.to_string()
}

/// Root structure of hooks_mcp.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksMcpConfig {
    #[serde(default = "default_server_name")]
    pub server_name: String,

    #[serde(default = "default_server_description")]
    pub server_description: String,

    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub prompts: Vec<Prompt>,

    /// Restricts which prompts the get_prompt tool exposes; empty hides the tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_prompt_tool_filter: Option<Vec<String>>,

    /// Directory of the file this config was loaded from
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for HooksMcpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            server_description: default_server_description(),
            actions: Vec::new(),
            prompts: Vec::new(),
            get_prompt_tool_filter: None,
            config_dir: PathBuf::from("."),
        }
    }
}

impl HooksMcpConfig {
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.name == name)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Prompts reachable through the get_prompt tool, honoring the filter
    pub fn exposed_prompts(&self) -> Vec<&Prompt> {
        match &self.get_prompt_tool_filter {
            None => self.prompts.iter().collect(),
            Some(filter) => self
                .prompts
                .iter()
                .filter(|p| filter.iter().any(|name| name == &p.name))
                .collect(),
        }
    }

    /// Names of required_env_var parameters that are unset or empty
    pub fn missing_required_env_vars(&self, env: &dyn EnvLookup) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for action in &self.actions {
            for param in &action.parameters {
                if param.kind != ParameterKind::RequiredEnvVar {
                    continue;
                }
                let unset = env.var(&param.name).map_or(true, |v| v.is_empty());
                if unset && !missing.contains(&param.name) {
                    missing.push(param.name.clone());
                }
            }
        }
        missing
    }
}
