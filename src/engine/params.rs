//! Parameter resolution
//!
//! Turns an action's declared parameters plus the caller's arguments into
//! the name → value map used for substitution and for the child's
//! environment. Env-sourced parameters are read through an injected
//! [`EnvLookup`] and never from the caller.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use super::command_executor::ExecutionError;
use crate::config::actions::{Action, ActionParameter, ParameterKind};
use crate::io::env::EnvLookup;
use crate::io::paths::resolve_project_path;

/// Per-invocation parameter values, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    values: Vec<(String, String)>,
}

impl ResolvedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing an earlier one with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResolvedEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = ResolvedEnvironment::new();
        for (k, v) in iter {
            env.insert(k, v);
        }
        env
    }
}

/// Text form of a caller-supplied JSON argument; `null` counts as absent
pub fn argument_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Validates caller arguments against an action's parameter schema
pub struct ParameterResolver<'a> {
    project_root: &'a Path,
    env: &'a dyn EnvLookup,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(project_root: &'a Path, env: &'a dyn EnvLookup) -> Self {
        Self { project_root, env }
    }

    /// Resolve every declared parameter of `action`
    pub fn resolve(
        &self,
        action: &Action,
        arguments: &Map<String, Value>,
    ) -> Result<ResolvedEnvironment, ExecutionError> {
        let mut resolved = ResolvedEnvironment::new();

        for param in &action.parameters {
            match param.kind {
                ParameterKind::RequiredEnvVar | ParameterKind::OptionalEnvVar => {
                    match self.env.var(&param.name) {
                        Some(value) => resolved.insert(param.name.as_str(), value),
                        None if param.kind == ParameterKind::RequiredEnvVar => {
                            return Err(ExecutionError::MissingEnvVar {
                                action: action.name.clone(),
                                param: param.name.clone(),
                            });
                        }
                        None => debug!(
                            "Optional env var '{}' unset for action '{}'",
                            param.name, action.name
                        ),
                    }
                }
                ParameterKind::ProjectFilePath => {
                    let value = self.caller_value(action, param, arguments)?;
                    self.check_project_path(action, param, &value)?;
                    resolved.insert(param.name.as_str(), value);
                }
                ParameterKind::InsecureString => {
                    let value = self.caller_value(action, param, arguments)?;
                    resolved.insert(param.name.as_str(), value);
                }
            }
        }

        debug!(
            "Resolved {} of {} parameters for action '{}'",
            resolved.len(),
            action.parameters.len(),
            action.name
        );
        Ok(resolved)
    }

    /// Caller argument, falling back to the declared default
    fn caller_value(
        &self,
        action: &Action,
        param: &ActionParameter,
        arguments: &Map<String, Value>,
    ) -> Result<String, ExecutionError> {
        arguments
            .get(&param.name)
            .and_then(argument_to_string)
            .or_else(|| param.default.clone())
            .ok_or_else(|| ExecutionError::MissingParameter {
                action: action.name.clone(),
                param: param.name.clone(),
            })
    }

    fn check_project_path(
        &self,
        action: &Action,
        param: &ActionParameter,
        value: &str,
    ) -> Result<(), ExecutionError> {
        let resolved = resolve_project_path(value, self.project_root, self.env).map_err(|rejection| {
            debug!("Parameter '{}' rejected: {}", param.name, rejection);
            ExecutionError::InvalidPath {
                action: action.name.clone(),
                param: param.name.clone(),
                value: value.to_string(),
            }
        })?;

        if !resolved.exists() {
            return Err(ExecutionError::PathNotFound {
                action: action.name.clone(),
                param: param.name.clone(),
                value: value.to_string(),
            });
        }
        Ok(())
    }
}
