use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

/// Global configuration at ~/.config/innsync/config.toml
///
/// Everything has a default so the CLI works without any config file:
/// data lands under the platform data directory and the session is a
/// privileged writer.
#[derive(Deserialize, Clone, Default)]
pub struct GlobalConfig {
    /// Where the cache and local backups live. Defaults to
    /// `<data dir>/innsync`.
    pub data_dir: Option<PathBuf>,

    /// Open the calendar read-only: viewing and exporting work,
    /// mutations are rejected.
    #[serde(default)]
    pub read_only: bool,
}

impl GlobalConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("innsync");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<GlobalConfig> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join("innsync");
        Ok(dir)
    }
}
