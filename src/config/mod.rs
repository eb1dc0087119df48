pub mod actions;
pub mod loader;
pub mod prompts;
pub mod types;

pub use actions::{Action, ActionParameter, ParameterKind, DEFAULT_TIMEOUT_SECS};
pub use loader::ConfigLoader;
pub use prompts::{Prompt, PromptArgument};
pub use types::HooksMcpConfig;
