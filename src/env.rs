//! Typed access to environment variables.
//!
//! Unset variables fall back to the caller's default. A variable that is set
//! but does not parse as the requested type is a [`ConfigError::Invalid`].

use crate::error::ConfigError;
use std::collections::HashMap;
use std::str::FromStr;

/// Source of process-wide key/value environment state.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

pub fn get_string(env: &dyn EnvSource, name: &str) -> Option<String> {
    env.var(name)
}

pub fn get_int(env: &dyn EnvSource, name: &str, default: i64) -> Result<i64, ConfigError> {
    parse_or_default(env, name, default, "an INTEGER")
}

pub fn get_float(env: &dyn EnvSource, name: &str, default: f64) -> Result<f64, ConfigError> {
    parse_or_default(env, name, default, "a NUMBER")
}

fn parse_or_default<T: FromStr>(
    env: &dyn EnvSource,
    name: &str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match env.var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            expected,
        }),
    }
}
