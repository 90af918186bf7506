use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_news_api_base")]
    pub news_api_base: String,

    #[serde(default)]
    pub news_api_key: String,

    #[serde(default = "default_news_country")]
    pub news_country: String,

    #[serde(default = "default_news_category")]
    pub news_category: String,

    /// Model runner invoked per image: program followed by its arguments.
    #[serde(default)]
    pub classifier_command: Vec<String>,

    #[serde(default = "default_max_image_side")]
    pub max_image_side: u32,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asclepius");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("asclepius_db").to_string_lossy().to_string()
}

fn default_news_api_base() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_country() -> String {
    "us".to_string()
}

fn default_news_category() -> String {
    "health".to_string()
}

fn default_max_image_side() -> u32 {
    1080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            news_api_base: default_news_api_base(),
            news_api_key: String::new(),
            news_country: default_news_country(),
            news_category: default_news_category(),
            classifier_command: Vec::new(),
            max_image_side: default_max_image_side(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("asclepius")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_file_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asclepius").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.news_country, "us");
        assert_eq!(config.news_category, "health");

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "news_api_key = \"abc\"\nclassifier_command = [\"python3\", \"classify.py\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.news_api_key, "abc");
        assert_eq!(config.classifier_command, vec!["python3", "classify.py"]);
        assert_eq!(config.news_api_base, "https://newsapi.org/v2");
        assert_eq!(config.max_image_side, 1080);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_image_side = \"big\"").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Toml(_))));
    }
}
