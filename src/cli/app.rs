use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "./hooks_mcp.yaml";

/// HooksMCP: project-specific development tools and prompts over MCP
#[derive(Debug, Parser)]
#[command(name = "hooks-mcp")]
#[command(version)]
#[command(about = "MCP server for project-specific development tools and prompts")]
#[command(
    long_about = "HooksMCP exposes the actions and prompts declared in hooks_mcp.yaml as MCP tools and prompts over stdio. Commands run without a shell, and file path parameters are confined to the project directory."
)]
pub struct Cli {
    /// Path to the HooksMCP configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    /// Working directory to use for the server (default: current directory)
    #[arg(short = 'w', long, visible_alias = "wd")]
    pub working_directory: Option<PathBuf>,

    /// Disable the get_prompt tool entirely, like an empty get_prompt_tool_filter
    #[arg(long)]
    pub disable_prompt_tool: bool,

    /// Validate the configuration, print a summary and exit
    #[arg(long)]
    pub check: bool,

    /// Treat configuration warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Log level (RUST_LOG overrides)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
