use std::path::PathBuf;
use tracing::info;

use super::{load_config, CommandHandler};
use crate::engine::CommandExecutor;
use crate::io::env::{EnvLookup, ProcessEnv};
use crate::server::{serve_stdio, McpServer};
use crate::{HooksMcpError, Result};

/// Handler for serving the configuration over stdio
pub struct ServeCommand {
    pub config_path: PathBuf,
    pub disable_prompt_tool: bool,
    pub strict: bool,
}

impl ServeCommand {
    pub fn new(config_path: PathBuf, disable_prompt_tool: bool, strict: bool) -> Self {
        Self {
            config_path,
            disable_prompt_tool,
            strict,
        }
    }

    /// Load the configuration and build the server without starting it
    ///
    /// The project root is the current working directory.
    pub fn prepare(&self, env: &dyn EnvLookup) -> Result<McpServer> {
        let config = load_config(&self.config_path, self.strict)?;

        let missing = config.missing_required_env_vars(env);
        if !missing.is_empty() {
            return Err(HooksMcpError::Config(format!(
                "Required environment variables not set: {}. Please set these variables before running the server.",
                missing.join(", ")
            )));
        }

        let project_root = std::env::current_dir()?;
        info!("Project root: {}", project_root.display());

        let server = McpServer::new(config, CommandExecutor::new(project_root));
        Ok(if self.disable_prompt_tool {
            server.without_prompt_tool()
        } else {
            server
        })
    }
}

impl CommandHandler for ServeCommand {
    fn execute(&self) -> Result<()> {
        let server = self.prepare(&ProcessEnv)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(serve_stdio(server))
    }

    fn name(&self) -> &'static str {
        "serve"
    }
}
