use thiserror::Error;

use crate::engine::command_executor::ExecutionError;
use crate::engine::prompts::PromptError;

#[derive(Error, Debug)]
pub enum HooksMcpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HooksMcpError>;
