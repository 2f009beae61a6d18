// ABOUTME: Config values that may be read from the process environment.
// ABOUTME: Used for credentials; Display never prints a literal value.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// `{ env: VAR, default: ... }` in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvRef {
    pub env: String,
    #[serde(default)]
    pub default: Option<String>,
}

/// A plain string, or a reference to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    Env(EnvRef),
}

impl EnvValue {
    pub fn env(var: impl Into<String>, default: Option<&str>) -> Self {
        EnvValue::Env(EnvRef {
            env: var.into(),
            default: default.map(str::to_string),
        })
    }

    /// The value; an unset variable falls back to its default, else errors.
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(value) => Ok(value.clone()),
            EnvValue::Env(EnvRef { env, default }) => std::env::var(env)
                .ok()
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(env.clone())),
        }
    }

    /// Like `resolve`, but blank or unresolvable values are `None`.
    pub fn resolve_optional(&self) -> Option<String> {
        match self.resolve() {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("{self} not usable: {e}");
                None
            }
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("<inline value>"),
            EnvValue::Env(r) => write!(f, "${}", r.env),
        }
    }
}
