use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use hooks_mcp::cli::commands::{check::CheckCommand, serve::ServeCommand, CommandHandler};
use hooks_mcp::cli::logging::init_logging;
use hooks_mcp::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json);

    if let Some(dir) = &cli.working_directory {
        std::env::set_current_dir(dir).with_context(|| {
            format!("Failed to change working directory to '{}'", dir.display())
        })?;
    }

    let command: Box<dyn CommandHandler> = if cli.check {
        Box::new(CheckCommand::new(cli.config_path, cli.strict))
    } else {
        Box::new(ServeCommand::new(
            cli.config_path,
            cli.disable_prompt_tool,
            cli.strict,
        ))
    };

    debug!("Running {} command", command.name());
    command
        .execute()
        .with_context(|| format!("HooksMCP {} failed", command.name()))
}
