use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CHAR_DELAY_MS: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_code_fences: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("snippet").join("config.json"))
    }
}

/// Settings for the generation client, resolved from the environment first and
/// the config file second.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
    pub strip_code_fences: bool,
}

impl ClientSettings {
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Same as [`ClientSettings::resolve`] with an injectable environment.
    pub fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = env("GEMINI_API_KEY")
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();
        let api_base = env("GEMINI_API_BASE")
            .or_else(|| config.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = env("GEMINI_MODEL")
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            timeout: Duration::from_secs(60),
            strip_code_fences: config.strip_code_fences.unwrap_or(true),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

pub fn char_delay(config: &Config) -> Duration {
    Duration::from_millis(config.char_delay_ms.unwrap_or(DEFAULT_CHAR_DELAY_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            theme: Some("dark".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn test_env_overrides_config_file() {
        let config = Config {
            api_key: Some("from-file".to_string()),
            model: Some("file-model".to_string()),
            ..Config::default()
        };
        let settings = ClientSettings::resolve_with(&config, |name| match name {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            _ => None,
        });

        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.model, "file-model");
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert!(settings.strip_code_fences);
    }

    #[test]
    fn test_absent_key_resolves_to_empty() {
        let settings = ClientSettings::resolve_with(&Config::default(), |_| None);
        assert!(!settings.has_api_key());
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_api_base_trailing_slash_is_trimmed() {
        let settings = ClientSettings::resolve_with(&Config::default(), |name| match name {
            "GEMINI_API_BASE" => Some("http://127.0.0.1:8080/models/".to_string()),
            _ => None,
        });
        assert_eq!(settings.api_base, "http://127.0.0.1:8080/models");
    }
}
