use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{client::NwsClient, format::Format};

/// Settings stored on disk between runs.
///
/// Example TOML:
/// ```toml
/// user_agent_id = "me@example.com"
/// api_host = "api.weather.gov"
/// timeout_secs = 20
/// default_format = "json-ld"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Contact identifier sent in the `User-Agent` header, generally an email address.
    pub user_agent_id: Option<String>,
    pub api_host: Option<String>,
    pub timeout_secs: Option<u64>,
    pub default_format: Option<String>,
}

impl Config {
    /// The configured contact, or an error telling the user how to set one.
    pub fn contact(&self) -> Result<&str> {
        self.user_agent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No contact identifier configured.\n\
                     Hint: run `nws configure <email>` first, or pass `--contact <email>`."
                )
            })
    }

    /// Parsed default format, `None` when unset.
    pub fn default_format(&self) -> Result<Option<Format>> {
        self.default_format
            .as_deref()
            .map(|name| {
                Format::try_from(name)
                    .with_context(|| format!("Invalid default_format '{name}' in config file"))
            })
            .transpose()
    }

    /// Build a client from the stored settings, optionally overriding the contact.
    pub fn client(&self, contact_override: Option<&str>) -> Result<NwsClient> {
        let contact = match contact_override {
            Some(contact) => contact,
            None => self.contact()?,
        };

        let mut builder = NwsClient::builder(contact);
        if let Some(host) = &self.api_host {
            builder = builder.api_host(host);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().context("Failed to create api.weather.gov client")
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("gov", "weather", "nws")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
