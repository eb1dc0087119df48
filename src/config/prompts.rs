use serde::{Deserialize, Serialize};

/// Longest prompt name accepted in the configuration
pub const MAX_PROMPT_NAME_LEN: usize = 32;

/// Longest prompt description accepted in the configuration
pub const MAX_PROMPT_DESCRIPTION_LEN: usize = 256;

/// An argument a prompt template accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,
}

/// A prompt template, either inline or stored in a file next to the config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,

    pub description: String,

    /// Inline prompt text
    #[serde(rename = "prompt", default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,

    /// Path to the prompt text, relative to the configuration file
    #[serde(rename = "prompt-file", default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<String>,

    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

impl Prompt {
    pub fn inline(
        name: impl Into<String>,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompt_text: Some(text.into()),
            prompt_file: None,
            arguments: Vec::new(),
        }
    }

    pub fn from_file(
        name: impl Into<String>,
        description: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompt_text: None,
            prompt_file: Some(file.into()),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn required_arguments(&self) -> impl Iterator<Item = &PromptArgument> {
        self.arguments.iter().filter(|a| a.required)
    }
}
