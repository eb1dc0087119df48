pub mod env;
pub mod paths;

pub use env::{load_env_file, EnvLookup, ProcessEnv};
pub use paths::{resolve_project_path, validate_project_path, validate_project_path_with, PathRejection};
