//! Translator types

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Longest accepted parameter name
pub const MAX_PARAM_NAME_LEN: usize = 64;

/// Longest accepted parameter value, in bytes
pub const MAX_PARAM_VALUE_LEN: usize = 4096;

/// Rejected translation parameter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid parameter name: {0:?}")]
    InvalidName(String),

    #[error("Parameter not allowed: {0}")]
    NotAllowed(String),

    #[error("Value of parameter {name} exceeds {max} bytes")]
    ValueTooLong { name: String, max: usize },

    #[error("Parameter {0} must not be null")]
    NullValue(String),

    #[error("'data' field must be a JSON object: {0}")]
    InvalidData(String),
}

/// Errors raised while running the external translator
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Failed to start translator '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Translator I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Translator exited with {}", exit_description(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("Translator did not finish within {0:?}")]
    TimedOut(Duration),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Flat name/value map handed to the translator as one JSON argument
///
/// Names are checked on insert; an optional allow-list narrows them further.
#[derive(Debug, Clone, Default)]
pub struct TranslationParams {
    values: BTreeMap<String, String>,
    allowed: Option<Vec<String>>,
}

impl TranslationParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only names in `allowed` will be accepted
    pub fn with_allow_list(allowed: Option<Vec<String>>) -> Self {
        Self {
            values: BTreeMap::new(),
            allowed,
        }
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> Result<(), ParamError> {
        Self::validate_name(name)?;

        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|a| a == name) {
                return Err(ParamError::NotAllowed(name.to_string()));
            }
        }

        let value = value.into();
        if value.len() > MAX_PARAM_VALUE_LEN {
            return Err(ParamError::ValueTooLong {
                name: name.to_string(),
                max: MAX_PARAM_VALUE_LEN,
            });
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Merge the entries of a JSON object (the `data` form field).
    ///
    /// Strings are taken as-is; numbers, booleans, arrays and objects are
    /// passed on as their JSON text (`"pages": [1,2]` becomes `"[1,2]"`).
    /// With `overwrite == false`, names already present are kept.
    pub fn merge_json(&mut self, raw: &str, overwrite: bool) -> Result<(), ParamError> {
        let parsed: Value =
            serde_json::from_str(raw).map_err(|e| ParamError::InvalidData(e.to_string()))?;
        let Value::Object(object) = parsed else {
            return Err(ParamError::InvalidData("not an object".to_string()));
        };

        for (name, value) in object {
            if !overwrite && self.values.contains_key(&name) {
                continue;
            }
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => return Err(ParamError::NullValue(name)),
                nested => nested.to_string(),
            };
            self.insert(&name, text)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode as a single JSON object string, keys sorted
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.values)
    }

    fn validate_name(name: &str) -> Result<(), ParamError> {
        // Names travel inside JSON, but keep them to a conservative charset
        if name.is_empty() || name.len() > MAX_PARAM_NAME_LEN {
            return Err(ParamError::InvalidName(name.to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ParamError::InvalidName(name.to_string()));
        }
        Ok(())
    }
}

/// Result of a successful translator run
#[derive(Debug)]
pub struct TranslationOutput {
    /// Everything the translator wrote to stdout
    pub bytes: Vec<u8>,
    /// Captured stderr, for logs only
    pub stderr: String,
    pub elapsed: Duration,
}
