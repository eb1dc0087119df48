use std::fmt::Write as _;
use std::path::PathBuf;

use super::{load_config, CommandHandler};
use crate::config::HooksMcpConfig;
use crate::io::env::ProcessEnv;
use crate::Result;

/// Handler for `--check`: validate and summarize without serving
pub struct CheckCommand {
    pub config_path: PathBuf,
    pub strict: bool,
}

impl CheckCommand {
    pub fn new(config_path: PathBuf, strict: bool) -> Self {
        Self {
            config_path,
            strict,
        }
    }
}

impl CommandHandler for CheckCommand {
    fn execute(&self) -> Result<()> {
        let config = load_config(&self.config_path, self.strict)?;
        let missing = config.missing_required_env_vars(&ProcessEnv);
        print!("{}", summarize(&self.config_path, &config, &missing));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "check"
    }
}

/// Human-readable summary of a loaded configuration
pub fn summarize(path: &std::path::Path, config: &HooksMcpConfig, missing_env: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Configuration OK: {}", path.display());
    let _ = writeln!(out, "Server: {}", config.server_name);

    let _ = writeln!(out, "Actions ({}):", config.actions.len());
    for action in &config.actions {
        let params: Vec<String> = action
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect();
        if params.is_empty() {
            let _ = writeln!(out, "  - {}: {}", action.name, action.description);
        } else {
            let _ = writeln!(
                out,
                "  - {}: {} [{}]",
                action.name,
                action.description,
                params.join(", ")
            );
        }
    }

    let _ = writeln!(out, "Prompts ({}):", config.prompts.len());
    for prompt in &config.prompts {
        let _ = writeln!(out, "  - {}: {}", prompt.name, prompt.description);
    }

    if !missing_env.is_empty() {
        let _ = writeln!(
            out,
            "Warning: required environment variables not set: {}",
            missing_env.join(", ")
        );
    }
    out
}
