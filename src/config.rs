use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::game::question::QuestionType;

pub const APP_NAME: &str = "trivia";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Query Open Trivia DB directly.
    Opentdb,
    /// Go through the `/api/questions` proxy at `api_url`.
    Proxy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_source")]
    pub source: SourceKind,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub category: Option<u32>,
    #[serde(default = "default_question_type")]
    pub question_type: String,
}

fn default_theme() -> String {
    "dark".to_string()
}
fn default_source() -> SourceKind {
    SourceKind::Opentdb
}
fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_question_type() -> String {
    "any".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            source: default_source(),
            api_url: default_api_url(),
            category: None,
            question_type: default_question_type(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize_question_type();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Persist only `theme`, leaving every other on-disk value alone. The
    /// in-memory config may carry one-off CLI overrides that must not stick.
    pub fn save_theme(theme: &str) -> Result<()> {
        Self::save_theme_to(&Self::config_path(), theme)
    }

    pub fn save_theme_to(path: &Path, theme: &str) -> Result<()> {
        let mut on_disk = Self::load_from(path)?;
        on_disk.theme = theme.to_string();
        on_disk.save_to(path)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join("config.toml")
    }

    pub fn question_kind(&self) -> Option<QuestionType> {
        QuestionType::from_config(&self.question_type)
    }

    /// Unknown question types mean "any".
    pub fn normalize_question_type(&mut self) {
        if !matches!(self.question_type.as_str(), "any" | "boolean" | "multiple") {
            self.question_type = default_question_type();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.source, SourceKind::Opentdb);
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.category, None);
        assert_eq!(config.question_kind(), None);
    }

    #[test]
    fn test_config_partial_file() {
        let toml_str = r#"
theme = "light"
source = "proxy"
category = 18
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "light");
        assert_eq!(config.source, SourceKind::Proxy);
        assert_eq!(config.category, Some(18));
        assert_eq!(config.question_type, "any");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.theme = "light".to_string();
        config.question_type = "boolean".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.theme, "light");
        assert_eq!(loaded.question_kind(), Some(QuestionType::Boolean));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn test_save_theme_keeps_other_fields_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "source = \"proxy\"\ncategory = 18\n").unwrap();

        // A CLI override lives only in memory.
        let mut running = Config::load_from(&path).unwrap();
        running.category = Some(31);
        running.api_url = "http://elsewhere:9000".to_string();
        running.theme = "light".to_string();
        Config::save_theme_to(&path, &running.theme).unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.theme, "light");
        assert_eq!(saved.source, SourceKind::Proxy);
        assert_eq!(saved.category, Some(18));
        assert_eq!(saved.api_url, "http://localhost:3000");
    }

    #[test]
    fn test_save_theme_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivia").join("config.toml");
        Config::save_theme_to(&path, "light").unwrap();
        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.theme, "light");
        assert_eq!(saved.category, None);
    }

    #[test]
    fn test_unknown_question_type_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "question_type = \"essay\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.question_type, "any");
    }
}
