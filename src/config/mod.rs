use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "digger";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    /// Where player preferences are persisted. Defaults to the platform data dir.
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_volume")]
    pub default_volume: u8,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_volume() -> u8 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            api_token: None,
            preferences_path: None,
            log_level: default_log_level(),
            default_volume: default_volume(),
        }
    }
}

impl Config {
    pub fn preferences_path(&self) -> Result<PathBuf> {
        match self.preferences_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .context("Could not find data directory")?
                .join(APP_DIR)
                .join("preferences.json")),
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not find config directory")?
        .join(APP_DIR);

    Ok(config_dir.join("config.yml"))
}

pub fn load_or_create_config() -> Result<Config> {
    load_or_create_config_at(&get_config_path()?)
}

pub fn load_or_create_config_at(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = Config::default();
        let yaml =
            serde_yaml::to_string(&default_config).context("Failed to serialize default config")?;

        fs::write(config_path, yaml).context("Failed to write default config file")?;

        eprintln!("Config file created at: {}", config_path.display());
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(config_path).context("Failed to read config file")?;

    let config: Config =
        serde_yaml::from_str(&config_content).context("Failed to parse config file")?;

    if config.server_url.trim().is_empty() {
        anyhow::bail!("server_url not set in config file: {}", config_path.display());
    }
    if config.default_volume > 100 {
        anyhow::bail!(
            "default_volume must be between 0 and 100 in config file: {}",
            config_path.display()
        );
    }

    Ok(config)
}
