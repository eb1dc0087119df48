use serde::{Deserialize, Deserializer, Serialize};

/// Default subprocess timeout for an action, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Accepts `default: 8080` or `default: true` as well as quoted strings
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml_ng::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(D::Error::custom("parameter default must be a scalar value")),
    }
}

/// Where a parameter's value comes from and how it is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Caller-supplied path that must stay inside the project root and exist
    ProjectFilePath,
    /// Read from the server's environment; the call fails if it is unset
    RequiredEnvVar,
    /// Read from the server's environment; omitted if unset
    OptionalEnvVar,
    /// Caller-supplied string used verbatim, without any validation
    InsecureString,
}

impl ParameterKind {
    /// Env-sourced parameters are never accepted from the client
    pub fn is_env_sourced(&self) -> bool {
        matches!(self, ParameterKind::RequiredEnvVar | ParameterKind::OptionalEnvVar)
    }

    /// Name as written in the YAML configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::ProjectFilePath => "project_file_path",
            ParameterKind::RequiredEnvVar => "required_env_var",
            ParameterKind::OptionalEnvVar => "optional_env_var",
            ParameterKind::InsecureString => "insecure_string",
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named input to an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParameterKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
}

impl ActionParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Description shown to clients, falling back to a generic label
    pub fn display_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Parameter {}", self.name))
    }
}

/// A named, parameterized command exposed as an MCP tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,

    pub description: String,

    /// Command template; `$NAME` placeholders refer to parameters
    pub command: String,

    #[serde(default)]
    pub parameters: Vec<ActionParameter>,

    /// Working directory relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_path: Option<String>,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: command.into(),
            parameters: Vec::new(),
            run_path: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_parameter(mut self, parameter: ActionParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_run_path(mut self, run_path: impl Into<String>) -> Self {
        self.run_path = Some(run_path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parameters the client is expected to supply
    pub fn client_parameters(&self) -> impl Iterator<Item = &ActionParameter> {
        self.parameters.iter().filter(|p| !p.kind.is_env_sourced())
    }
}
