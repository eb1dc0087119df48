//! Action execution engine
//!
//! Parameter resolution, command building and process execution, output
//! normalization, and prompt rendering.

pub mod command_executor;
pub mod output;
pub mod params;
pub mod prompts;

pub use command_executor::{CommandExecutor, ExecutionError, ExecutionResult};
pub use output::normalize_terminal_output;
pub use params::{ParameterResolver, ResolvedEnvironment};
pub use prompts::{prompt_content, render_prompt, PromptError};
