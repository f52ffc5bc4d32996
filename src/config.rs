//! Configuration management for the pdf2zh relay
//!
//! Values come from the process environment (a `.env` file is loaded by
//! `main` through `dotenvy` before [`Config::from_env`] runs).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default request body limit: 100MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default bound on a single translator run
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub translator: TranslatorConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// How the external translator is launched
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Program to execute (resolved through PATH when not a path)
    pub command: String,
    /// Leading arguments, placed before the file path and the parameter blob
    pub args: Vec<String>,
    /// Working directory for the child (default: inherit)
    pub working_dir: Option<PathBuf>,
    /// Maximum time a single run may take before it is killed
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory for staging files (default: system temp)
    pub staging_dir: Option<PathBuf>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// When set, only these parameter names are accepted
    pub allowed_params: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            translator: TranslatorConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            command: "python".to_string(),
            args: vec!["pdf2zh.py".to_string()],
            working_dir: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            staging_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_params: None,
        }
    }
}

impl UploadConfig {
    /// Resolved staging directory
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Unset or blank variables fall back to their defaults; set but
    /// unparsable ones are reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let port = match get("SERVER_PORT") {
            Some(v) => parse_var("SERVER_PORT", &v)?,
            None => defaults.server.port,
        };

        let command = get("TRANSLATOR_COMMAND").unwrap_or(defaults.translator.command);
        let args = match lookup("TRANSLATOR_ARGS") {
            Some(v) => v.split_whitespace().map(str::to_string).collect(),
            None => defaults.translator.args,
        };

        let timeout_secs: u64 = match get("TRANSLATOR_TIMEOUT_SECS") {
            Some(v) => parse_var("TRANSLATOR_TIMEOUT_SECS", &v)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "TRANSLATOR_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => parse_var("MAX_UPLOAD_BYTES", &v)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let allowed_params = match get("TRANSLATOR_ALLOWED_PARAMS") {
            Some(v) => {
                let names: Vec<String> = v
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(ConfigError::Empty("TRANSLATOR_ALLOWED_PARAMS"));
                }
                Some(names)
            }
            None => None,
        };

        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            translator: TranslatorConfig {
                command,
                args,
                working_dir: get("TRANSLATOR_WORKDIR").map(PathBuf::from),
                timeout: Duration::from_secs(timeout_secs),
            },
            upload: UploadConfig {
                staging_dir: get("STAGING_DIR").map(PathBuf::from),
                max_upload_bytes,
                allowed_params,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}
