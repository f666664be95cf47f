//! Framework configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. A TOML file (`courier.toml`, or `courier-{env}.toml` for an environment)
//! 3. `COURIER_*` environment variables

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base name of the configuration file
pub const CONFIG_FILE_STEM: &str = "courier";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "COURIER_CONFIG_PATH";

/// Which codec both ends of a deployment use
///
/// The wire format is not self-describing, so provider and consumer must be
/// configured with the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    #[default]
    Bincode,
    Json,
}

impl FromStr for SerializerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bincode" => Ok(Self::Bincode),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!("unknown serializer: {other}"))),
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bincode => f.write_str("bincode"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// How request and response payloads travel between the two processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Tcp,
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "tcp" => Ok(Self::Tcp),
            other => Err(Error::config(format!("unknown transport: {other}"))),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub name: String,
    pub version: String,
    pub server_host: String,
    pub server_port: u16,
    pub serializer: SerializerKind,
    pub transport: TransportKind,
    /// Per-call timeout applied by the consumer's transport
    pub timeout_ms: Option<u64>,
    pub log_level: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            name: "courier".to_string(),
            version: "1.0".to_string(),
            server_host: "localhost".to_string(),
            server_port: 8080,
            serializer: SerializerKind::default(),
            transport: TransportKind::default(),
            timeout_ms: None,
            log_level: "info".to_string(),
            description: None,
            author: None,
            company: None,
            address: None,
        }
    }
}

impl RpcConfig {
    /// Load configuration from the working directory and the environment
    ///
    /// `environment` selects `courier-{environment}.toml` over `courier.toml`.
    pub fn load(environment: Option<&str>) -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(Error::config(format!(
                        "config file named by {CONFIG_PATH_ENV} not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            Err(_) => Self::load_from_dir(env::current_dir()?, environment)?,
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load the first matching config file in `dir`, or defaults if none exists
    ///
    /// Environment variables are not consulted.
    pub fn load_from_dir(dir: impl AsRef<Path>, environment: Option<&str>) -> Result<Self> {
        match find_config_file(dir.as_ref(), environment) {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Apply `COURIER_*` overrides looked up through `lookup`
    ///
    /// Values that fail to parse are ignored and the previous value is kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("COURIER_NAME") {
            self.name = value;
        }
        if let Some(value) = lookup("COURIER_VERSION") {
            self.version = value;
        }
        if let Some(value) = lookup("COURIER_SERVER_HOST") {
            self.server_host = value;
        }
        if let Some(value) = lookup("COURIER_SERVER_PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.server_port = port,
                Err(_) => tracing::warn!(%value, "ignoring invalid COURIER_SERVER_PORT"),
            }
        }
        if let Some(value) = lookup("COURIER_SERIALIZER") {
            match value.parse() {
                Ok(kind) => self.serializer = kind,
                Err(e) => tracing::warn!("ignoring COURIER_SERIALIZER: {e}"),
            }
        }
        if let Some(value) = lookup("COURIER_TRANSPORT") {
            match value.parse() {
                Ok(kind) => self.transport = kind,
                Err(e) => tracing::warn!("ignoring COURIER_TRANSPORT: {e}"),
            }
        }
        if let Some(value) = lookup("COURIER_TIMEOUT_MS") {
            if let Ok(ms) = value.parse::<u64>() {
                self.timeout_ms = Some(ms);
            }
        }
        if let Some(value) = lookup("COURIER_LOG_LEVEL") {
            self.log_level = value;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("name must not be empty"));
        }
        if self.server_host.trim().is_empty() {
            return Err(Error::config("server_host must not be empty"));
        }
        if self.server_port == 0 {
            return Err(Error::config("server_port must not be 0"));
        }
        Ok(())
    }

    /// `host:port` the provider listens on and the consumer targets
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Find `courier-{environment}.toml`, then `courier.toml`, in `dir`
fn find_config_file(dir: &Path, environment: Option<&str>) -> Option<PathBuf> {
    let environment = environment.map(str::trim).filter(|e| !e.is_empty());

    if let Some(env_name) = environment {
        let path = dir.join(format!("{CONFIG_FILE_STEM}-{env_name}.toml"));
        if path.exists() {
            return Some(path);
        }
        tracing::info!(environment = env_name, "no config file for environment, trying default");
    }

    let path = dir.join(format!("{CONFIG_FILE_STEM}.toml"));
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let config = RpcConfig::default();
        assert_eq!(config.name, "courier");
        assert_eq!(config.version, "1.0");
        assert_eq!(config.server_address(), "localhost:8080");
        assert_eq!(config.serializer, SerializerKind::Bincode);
        assert_eq!(config.transport, TransportKind::Http);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RpcConfig::from_toml("server_port = 9000\nserializer = \"json\"\n").unwrap();
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.serializer, SerializerKind::Json);
        assert_eq!(config.server_host, "localhost");
    }

    #[test]
    fn descriptive_fields_are_optional() {
        let config = RpcConfig::from_toml(
            "description = \"user lookups\"\ncompany = \"lenyan\"\naddress = \"Hangzhou\"\n",
        )
        .unwrap();
        assert_eq!(config.description.as_deref(), Some("user lookups"));
        assert_eq!(config.company.as_deref(), Some("lenyan"));
        assert_eq!(config.address.as_deref(), Some("Hangzhou"));
        assert!(config.author.is_none());
    }

    #[test]
    fn unknown_serializer_is_rejected() {
        let err = RpcConfig::from_toml("serializer = \"hessian\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("COURIER_SERVER_HOST", "10.0.0.1"),
            ("COURIER_SERVER_PORT", "not-a-port"),
            ("COURIER_SERIALIZER", "JSON"),
            ("COURIER_TRANSPORT", "tcp"),
            ("COURIER_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let mut config = RpcConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server_host, "10.0.0.1");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.serializer, SerializerKind::Json);
        assert_eq!(config.transport, TransportKind::Tcp);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn validate_rejects_port_zero() {
        let config = RpcConfig {
            server_port: 0,
            ..RpcConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
