pub mod check;
pub mod serve;

use std::path::Path;

use crate::config::{ConfigLoader, HooksMcpConfig};
use crate::io::env::load_env_file;
use crate::{HooksMcpError, Result};

/// Common trait for all command handlers
pub trait CommandHandler {
    /// Execute the command
    fn execute(&self) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;
}

/// Load a configuration file, optionally in strict mode
///
/// A `.env` file next to the configuration is loaded into the process
/// environment afterwards.
pub fn load_config(path: &Path, strict: bool) -> Result<HooksMcpConfig> {
    let loader = if strict {
        ConfigLoader::new().with_strict_validation()
    } else {
        ConfigLoader::new()
    };
    let config = loader.load(path)?;

    load_env_file(path).map_err(|e| {
        HooksMcpError::Config(format!(
            "Failed to load environment file next to '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(config)
}
