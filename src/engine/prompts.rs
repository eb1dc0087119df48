//! Prompt content loading and `{{argument}}` rendering

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::params::argument_to_string;
use crate::config::prompts::Prompt;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt '{0}' not found")]
    NotFound(String),

    #[error("Prompt '{0}' is not available through this tool")]
    NotExposed(String),

    #[error("Missing required argument '{argument}' for prompt '{prompt}'")]
    MissingArgument { prompt: String, argument: String },

    #[error("Failed to read prompt file {path} for prompt '{prompt}': {source}")]
    ReadFile {
        prompt: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt '{0}' has no text")]
    NoContent(String),
}

/// Raw prompt text, reading `prompt-file` relative to `config_dir`
pub fn prompt_content(prompt: &Prompt, config_dir: &Path) -> Result<String, PromptError> {
    if let Some(text) = &prompt.prompt_text {
        return Ok(text.clone());
    }

    let file = prompt
        .prompt_file
        .as_ref()
        .ok_or_else(|| PromptError::NoContent(prompt.name.clone()))?;
    let path = config_dir.join(file);
    debug!("Reading prompt '{}' from {}", prompt.name, path.display());

    std::fs::read_to_string(&path).map_err(|source| PromptError::ReadFile {
        prompt: prompt.name.clone(),
        path,
        source,
    })
}

/// Render a prompt with caller arguments
///
/// Required arguments must be present and non-null. Placeholders without a
/// matching argument are left as written.
pub fn render_prompt(
    prompt: &Prompt,
    config_dir: &Path,
    arguments: &Map<String, Value>,
) -> Result<String, PromptError> {
    if let Some(missing) = prompt
        .required_arguments()
        .find(|arg| arguments.get(&arg.name).and_then(argument_to_string).is_none())
    {
        return Err(PromptError::MissingArgument {
            prompt: prompt.name.clone(),
            argument: missing.name.clone(),
        });
    }

    let content = prompt_content(prompt, config_dir)?;
    Ok(substitute_arguments(&content, arguments))
}

/// Replace `{{name}}` with each argument's string form
pub fn substitute_arguments(template: &str, arguments: &Map<String, Value>) -> String {
    arguments.iter().fold(template.to_string(), |text, (name, value)| {
        match argument_to_string(value) {
            Some(value) => text.replace(&format!("{{{{{name}}}}}"), &value),
            None => text,
        }
    })
}
