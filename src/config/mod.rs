//! Typed configuration from environment variables or a TOML file.
//!
//! The endpoint has no default: every caller picks sandbox or production
//! explicitly. Sensitive values are wrapped in `secrecy::SecretString` to
//! prevent log leaks.

pub mod credentials;

use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;

use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::client::ClientConfig;
use crate::error::{Error, Result};
pub use credentials::{Credentials, SecretString};

/// Which requester service a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Non-billing test environment.
    Sandbox,
    Production,
}

impl Endpoint {
    pub fn url(self) -> &'static str {
        match self {
            Endpoint::Sandbox => "https://mechanicalturk.sandbox.amazonaws.com/",
            Endpoint::Production => "https://mechanicalturk.amazonaws.com/",
        }
    }

    pub fn is_sandbox(self) -> bool {
        self == Endpoint::Sandbox
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Endpoint::Sandbox),
            "production" => Ok(Endpoint::Production),
            other => Err(Error::Config(format!(
                "endpoint must be `sandbox` or `production`, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Sandbox => "sandbox",
            Endpoint::Production => "production",
        })
    }
}

#[derive(Debug)]
pub struct Config {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub endpoint: Endpoint,
    pub requests_per_second: Option<NonZeroU32>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// On-disk shape of a config file.
#[derive(Debug, Deserialize)]
struct FileConfig {
    access_key_id: String,
    secret_access_key: String,
    endpoint: Option<Endpoint>,
    requests_per_second: Option<NonZeroU32>,
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::load(None, None)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load(Some(path), None)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Self::parse_toml(content, None)
    }

    /// Load from `file` if given, otherwise from the environment. An
    /// explicit `endpoint` wins over the one in the file or `MTURK_ENDPOINT`;
    /// one of them must name it.
    pub fn load(file: Option<&Path>, endpoint: Option<Endpoint>) -> Result<Self> {
        match file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
                Self::parse_toml(&content, endpoint).map_err(|e| match e {
                    Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
                    other => other,
                })
            }
            None => Self::parse_env(endpoint),
        }
    }

    fn parse_env(endpoint: Option<Endpoint>) -> Result<Self> {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => required_var("MTURK_ENDPOINT")?.parse()?,
        };
        let requests_per_second = match std::env::var("MTURK_REQUESTS_PER_SECOND") {
            Ok(raw) => Some(raw.parse::<NonZeroU32>().map_err(|e| {
                Error::Config(format!("MTURK_REQUESTS_PER_SECOND must be a positive integer: {e}"))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            access_key_id: required_var("AWS_ACCESS_KEY_ID")?,
            secret_access_key: SecretString::from(required_var("AWS_SECRET_ACCESS_KEY")?),
            endpoint,
            requests_per_second,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn parse_toml(content: &str, endpoint: Option<Endpoint>) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        let endpoint = endpoint.or(file.endpoint).ok_or_else(|| {
            Error::Config("endpoint is required (`sandbox` or `production`)".to_string())
        })?;
        Ok(Self {
            access_key_id: file.access_key_id,
            secret_access_key: SecretString::from(file.secret_access_key),
            endpoint,
            requests_per_second: file.requests_per_second,
            otel_endpoint: file.otel_endpoint,
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.expose_secret(),
        )
    }

    /// Client settings derived from this configuration.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.credentials(), self.endpoint);
        match self.requests_per_second {
            Some(rate) => config.with_requests_per_second(rate),
            None => config,
        }
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
