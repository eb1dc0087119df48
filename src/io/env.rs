//! Environment lookup capability
//!
//! Everything that reads environment variables goes through [`EnvLookup`]
//! so tests can pin a fixed environment instead of mutating the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read-only access to environment variables
pub trait EnvLookup: Send + Sync {
    /// Value of `name`, or `None` when unset or not valid UTF-8
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Load the `.env` file next to `config_path` into the process environment
///
/// Variables that are already set keep their values. Returns the file that
/// was loaded, or `None` when there is no `.env` file.
pub fn load_env_file(config_path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    let config_dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let env_path = config_dir.join(".env");
    if !env_path.is_file() {
        debug!("No environment file at {}", env_path.display());
        return Ok(None);
    }

    dotenvy::from_path(&env_path)?;
    info!("Loaded environment from {}", env_path.display());
    Ok(Some(env_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_map_lookup() {
        let mut env = HashMap::new();
        env.insert("API_KEY".to_string(), "secret".to_string());
        assert_eq!(env.var("API_KEY").as_deref(), Some("secret"));
        assert!(env.var("MISSING").is_none());
    }

    #[test]
    fn test_process_env_reads_path() {
        // PATH is set in every test environment we run under
        assert!(ProcessEnv.var("PATH").is_some());
    }

    #[test]
    fn test_load_env_file_next_to_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "HOOKS_MCP_ENV_FILE_NEW=from-file\nHOOKS_MCP_ENV_FILE_PRESET=from-file\n",
        )
        .unwrap();
        std::env::set_var("HOOKS_MCP_ENV_FILE_PRESET", "from-process");

        let loaded = load_env_file(&dir.path().join("hooks_mcp.yaml")).unwrap();
        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(
            ProcessEnv.var("HOOKS_MCP_ENV_FILE_NEW").as_deref(),
            Some("from-file")
        );
        // The process environment wins over the file
        assert_eq!(
            ProcessEnv.var("HOOKS_MCP_ENV_FILE_PRESET").as_deref(),
            Some("from-process")
        );
    }

    #[test]
    fn test_missing_env_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let loaded = load_env_file(&dir.path().join("hooks_mcp.yaml")).unwrap();
        assert!(loaded.is_none());
    }
}
