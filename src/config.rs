//! Configuration loading.
//!
//! Folio reads one TOML file (default `./config/folio.toml`):
//!
//! ```toml
//! [db]
//! path = "./data/folio.sqlite"
//!
//! [owner]
//! email = "me@university.edu"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! identity_header = "x-verified-email"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub owner: OwnerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// The single identity allowed to edit.
#[derive(Debug, Deserialize, Clone)]
pub struct OwnerConfig {
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Request header carrying the email verified by the fronting auth proxy.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            identity_header: default_identity_header(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

fn default_identity_header() -> String {
    "x-verified-email".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let email = config.owner.email.trim();
    if email.is_empty() || !email.contains('@') {
        anyhow::bail!("owner.email must be an email address, got '{}'", config.owner.email);
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.server.identity_header.trim().is_empty() {
        anyhow::bail!("server.identity_header must not be empty");
    }

    Ok(())
}
