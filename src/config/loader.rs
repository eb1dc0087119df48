use super::actions::Action;
use super::prompts::{Prompt, MAX_PROMPT_DESCRIPTION_LEN, MAX_PROMPT_NAME_LEN};
use super::types::{HooksMcpConfig, GET_PROMPT_TOOL};
use crate::{HooksMcpError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// `$NAME` placeholders as they appear in command templates
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

/// Configuration loader for hooks_mcp.yaml
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Treat suspicious-but-legal configuration as an error
    strict: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Enable strict validation mode
    pub fn with_strict_validation(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<HooksMcpConfig> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HooksMcpError::Config(format!(
                "Configuration file '{}' not found",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            HooksMcpError::Config(format!(
                "Failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        info!("Loading configuration from {}", path.display());
        self.parse(&contents, &config_dir).map_err(|e| match e {
            HooksMcpError::Yaml(yaml) => HooksMcpError::Config(format!(
                "Failed to parse YAML file '{}': {}",
                path.display(),
                yaml
            )),
            other => other,
        })
    }

    /// Parse configuration text; prompt files are looked up in `config_dir`
    pub fn parse(&self, contents: &str, config_dir: &Path) -> Result<HooksMcpConfig> {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(contents)?;
        if !value.is_mapping() {
            return Err(HooksMcpError::Config(
                "Configuration file must contain a YAML object".to_string(),
            ));
        }

        let mut config: HooksMcpConfig = serde_yaml_ng::from_value(value)?;
        config.config_dir = config_dir.to_path_buf();

        self.validate(&config)?;

        debug!(
            "Loaded {} actions and {} prompts",
            config.actions.len(),
            config.prompts.len()
        );
        Ok(config)
    }

    /// Validate a parsed configuration
    pub fn validate(&self, config: &HooksMcpConfig) -> Result<()> {
        let mut action_names = HashSet::new();
        for (index, action) in config.actions.iter().enumerate() {
            self.validate_action(action, index)?;
            if !action_names.insert(action.name.as_str()) {
                return Err(HooksMcpError::Config(format!(
                    "Duplicate action name '{}'",
                    action.name
                )));
            }
        }

        let mut prompt_names = HashSet::new();
        for (index, prompt) in config.prompts.iter().enumerate() {
            self.validate_prompt(prompt, index, config.config_dir())?;
            if !prompt_names.insert(prompt.name.as_str()) {
                return Err(HooksMcpError::Config(format!(
                    "Duplicate prompt name '{}'",
                    prompt.name
                )));
            }
        }

        if let Some(filter) = &config.get_prompt_tool_filter {
            for name in filter {
                if !prompt_names.contains(name.as_str()) {
                    return Err(HooksMcpError::Config(format!(
                        "Prompt '{}' in get_prompt_tool_filter not found in prompts list",
                        name
                    )));
                }
            }
        }

        if !config.prompts.is_empty() && action_names.contains(GET_PROMPT_TOOL) {
            self.report(format!(
                "Action '{}' shadows the built-in prompt tool",
                GET_PROMPT_TOOL
            ))?;
        }

        Ok(())
    }

    /// Validate a single action definition
    fn validate_action(&self, action: &Action, index: usize) -> Result<()> {
        if action.name.trim().is_empty() {
            return Err(HooksMcpError::Config(format!(
                "'name' is required for each action (action[{}])",
                index
            )));
        }
        if action.description.trim().is_empty() {
            return Err(HooksMcpError::Config(format!(
                "'description' is required for action '{}'",
                action.name
            )));
        }
        if action.command.trim().is_empty() {
            return Err(HooksMcpError::Config(format!(
                "'command' is required for action '{}'",
                action.name
            )));
        }

        let mut names = HashSet::new();
        for param in &action.parameters {
            if param.name.trim().is_empty() {
                return Err(HooksMcpError::Config(format!(
                    "'name' is required for each parameter in action '{}'",
                    action.name
                )));
            }
            if !names.insert(param.name.as_str()) {
                return Err(HooksMcpError::Config(format!(
                    "Duplicate parameter '{}' in action '{}'",
                    param.name, action.name
                )));
            }
        }

        if let Err(e) = shell_words::split(&action.command) {
            return Err(HooksMcpError::Config(format!(
                "Invalid command syntax for action '{}': {}",
                action.name, e
            )));
        }

        for caps in PLACEHOLDER.captures_iter(&action.command) {
            let placeholder = &caps[1];
            let declared = action
                .parameters
                .iter()
                .any(|p| placeholder.starts_with(p.name.as_str()));
            if !declared {
                self.report(format!(
                    "Action '{}' references ${} but declares no such parameter",
                    action.name, placeholder
                ))?;
            }
        }

        Ok(())
    }

    /// Validate a single prompt definition
    fn validate_prompt(&self, prompt: &Prompt, index: usize, config_dir: &Path) -> Result<()> {
        if prompt.name.trim().is_empty() {
            return Err(HooksMcpError::Config(format!(
                "'name' is required for each prompt (prompt[{}])",
                index
            )));
        }
        if prompt.description.trim().is_empty() {
            return Err(HooksMcpError::Config(format!(
                "'description' is required for prompt '{}'",
                prompt.name
            )));
        }
        if prompt.name.chars().count() > MAX_PROMPT_NAME_LEN {
            return Err(HooksMcpError::Config(format!(
                "Prompt name '{}' exceeds {} character limit",
                prompt.name, MAX_PROMPT_NAME_LEN
            )));
        }
        if prompt.description.chars().count() > MAX_PROMPT_DESCRIPTION_LEN {
            return Err(HooksMcpError::Config(format!(
                "Prompt description for '{}' exceeds {} character limit",
                prompt.name, MAX_PROMPT_DESCRIPTION_LEN
            )));
        }

        match (&prompt.prompt_text, &prompt.prompt_file) {
            (None, None) => {
                return Err(HooksMcpError::Config(format!(
                    "Prompt '{}' must specify either 'prompt' or 'prompt-file'",
                    prompt.name
                )))
            }
            (Some(_), Some(_)) => {
                return Err(HooksMcpError::Config(format!(
                    "Prompt '{}' cannot specify both 'prompt' and 'prompt-file'",
                    prompt.name
                )))
            }
            (None, Some(file)) => {
                let full_path = config_dir.join(file);
                if !full_path.exists() {
                    return Err(HooksMcpError::Config(format!(
                        "Prompt file '{}' for prompt '{}' not found at {}",
                        file,
                        prompt.name,
                        full_path.display()
                    )));
                }
            }
            (Some(_), None) => {}
        }

        for argument in &prompt.arguments {
            if argument.name.trim().is_empty() {
                return Err(HooksMcpError::Config(format!(
                    "'name' is required for each prompt argument (prompt '{}')",
                    prompt.name
                )));
            }
        }

        Ok(())
    }

    /// Warn, or fail in strict mode
    fn report(&self, message: String) -> Result<()> {
        if self.strict {
            Err(HooksMcpError::Config(message))
        } else {
            warn!("{}", message);
            Ok(())
        }
    }
}

impl HooksMcpConfig {
    /// Load a configuration file with default validation
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        ConfigLoader::new().load(path)
    }

    /// Parse configuration text; prompt files resolve against `config_dir`
    pub fn from_yaml_str(contents: &str, config_dir: &Path) -> Result<Self> {
        ConfigLoader::new().parse(contents, config_dir)
    }
}
