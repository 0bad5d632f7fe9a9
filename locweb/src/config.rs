use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::debug;

/// The name of the connection string that is used for the location database
pub(crate) const DEFAULT_CONNECTION: &str = "Default";

/// Prefix of the environment variables that override a configured connection string
const CONNECTION_STRING_ENV_PREFIX: &str = "LOCWEB_CONNECTION_STRING_";

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListenConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_HOST: &str = "0.0.0.0";
fn default_listen() -> ListenConfig {
    ListenConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_HTTP_PORT,
    }
}

fn default_playground() -> bool {
    true
}

// This handles the case where the `listen` block is PRESENT, but a field may be missing.
fn deserialize_listen_with_defaults<'de, D>(deserializer: D) -> Result<ListenConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct PartialListenConfig {
        host: Option<String>,
        port: Option<u16>,
    }

    let partial_config = PartialListenConfig::deserialize(deserializer)?;
    Ok(ListenConfig {
        host: partial_config
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: partial_config.port.unwrap_or(DEFAULT_HTTP_PORT),
    })
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default = "default_listen")]
    #[serde(deserialize_with = "deserialize_listen_with_defaults")]
    pub(crate) listen: ListenConfig,
    #[serde(default)]
    pub(crate) connection_strings: HashMap<String, String>,
    #[serde(default = "default_playground")]
    pub(crate) playground: bool,
}

impl EnvConfig {
    /// Look up the connection string with the given name. An environment
    /// variable `LOCWEB_CONNECTION_STRING_<NAME>` takes priority over the value
    /// from the config file.
    pub(crate) fn connection_string(&self, name: &str) -> Result<String, Error> {
        self.connection_string_with(name, |var| std::env::var(var).ok())
    }

    fn connection_string_with<F>(&self, name: &str, lookup_env: F) -> Result<String, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = format!("{CONNECTION_STRING_ENV_PREFIX}{}", name.to_uppercase());
        if let Some(value) = lookup_env(&var) {
            debug!("Using connection string '{name}' from environment variable {var}");
            return Ok(value);
        }
        self.connection_strings
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingConnectionString(name.to_string()))
    }
}

/// The config file used when none is given on the command line
pub(crate) fn default_config_file() -> PathBuf {
    directories::ProjectDirs::from("org", "locationql", "locweb")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("locweb.yaml"))
}

/// Parse the config file and return the configuration for the environment `envname`
pub(crate) fn load(path: &Path, envname: &str) -> Result<EnvConfig> {
    debug!("Loading configuration '{envname}' from {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse(&contents, envname)
}

fn parse(contents: &str, envname: &str) -> Result<EnvConfig> {
    let mut configs: HashMap<String, EnvConfig> =
        serde_yaml::from_str(contents).with_context(|| "Failed to parse config file")?;
    configs.remove(envname).ok_or_else(|| {
        Error::Environment(format!("no environment named '{envname}' in config file")).into()
    })
}
