use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const APP_NAME: &str = "chanroll";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub api_key: Option<String>,
  pub theme_name: Option<String>,
  pub language: Option<String>,
}

impl Config {
  fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("prefs.toml"))
  }

  pub fn load() -> Self {
    if let Some(config_file) = Self::path()
      && let Ok(content) = std::fs::read_to_string(config_file)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(config_file) = Self::path()
      && let Some(config_dir) = config_file.parent()
      && std::fs::create_dir_all(config_dir).is_ok()
      && let Ok(content) = toml::to_string(self)
    {
      let _ = std::fs::write(config_file, content);
    }
  }

  /// The API key to use: an explicit value (CLI flag or environment) wins
  /// over the config file. Blank values count as absent.
  pub fn resolve_api_key(&self, explicit: Option<String>) -> Option<String> {
    let clean = |k: String| Some(k.trim().to_string()).filter(|k| !k.is_empty());
    explicit.and_then(clean).or_else(|| self.api_key.clone().and_then(clean))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_partial_file() {
    let config: Config = toml::from_str("api_key = \"abc\"\n").unwrap();
    assert_eq!(config.api_key.as_deref(), Some("abc"));
    assert_eq!(config.theme_name, None);
  }

  #[test]
  fn explicit_key_wins() {
    let config = Config { api_key: Some("from-file".to_string()), ..Default::default() };
    assert_eq!(config.resolve_api_key(Some("from-env".to_string())).as_deref(), Some("from-env"));
    assert_eq!(config.resolve_api_key(None).as_deref(), Some("from-file"));
  }

  #[test]
  fn blank_key_is_absent() {
    let config = Config { api_key: Some("  ".to_string()), ..Default::default() };
    assert_eq!(config.resolve_api_key(None), None);
    assert_eq!(Config::default().resolve_api_key(Some(String::new())), None);
  }
}
