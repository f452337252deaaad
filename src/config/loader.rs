use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use super::types::ProbeConfig;

const CONFIG_FILE_NAME: &str = "loginprobe.toml";

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./loginprobe.toml",
    "./config/loginprobe.toml",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `custom_path`, else the first readable file
    /// on the search path, else the defaults
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<ProbeConfig> {
        if let Some(path) = custom_path {
            if path.exists() {
                return Self::load_from_file(path)
                    .with_context(|| format!("Failed to load config from custom path: {:?}", path));
            }
            tracing::warn!("Custom config path does not exist: {:?}, falling back to defaults", path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                        continue;
                    }
                }
            }
        }

        tracing::info!("No configuration file found, using default settings");
        Ok(ProbeConfig::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();
        if let Some(dirs) = ProjectDirs::from("", "", "loginprobe") {
            paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }

    fn load_from_file(path: &Path) -> Result<ProbeConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ProbeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {:?}", path))?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate_config(config: &ProbeConfig) -> Result<()> {
        if config.http.max_redirects == 0 {
            anyhow::bail!("max_redirects must be greater than 0");
        }

        if config.http.user_agent.trim().is_empty() {
            anyhow::bail!("user_agent cannot be empty");
        }

        Ok(())
    }
}
