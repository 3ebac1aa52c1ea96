use crate::pagination::DEFAULT_CHARS_PER_PAGE;
use crate::provider::ProviderConfig;
use crate::scoring::RateUnit;
use crate::session::{Difficulty, SessionConfig, DEFAULT_ADVANCE_DELAY, DEFAULT_TEXT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chars_per_page must be at least 1")]
    ZeroPageSize,
    #[error("default_text must contain something to type")]
    BlankDefaultText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub chars_per_page: usize,
    pub difficulty: Difficulty,
    pub rate_unit: RateUnit,
    pub advance_delay_ms: u64,
    pub default_text: String,
    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
            difficulty: Difficulty::default(),
            rate_unit: RateUnit::default(),
            advance_delay_ms: DEFAULT_ADVANCE_DELAY.as_millis() as u64,
            default_text: DEFAULT_TEXT.to_string(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Command line values that take precedence over the stored config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub chars_per_page: Option<usize>,
    pub difficulty: Option<Difficulty>,
    pub rate_unit: Option<RateUnit>,
    pub advance_delay_ms: Option<u64>,
}

impl Config {
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(n) = overrides.chars_per_page {
            self.chars_per_page = n;
        }
        if let Some(d) = overrides.difficulty {
            self.difficulty = d;
        }
        if let Some(u) = overrides.rate_unit {
            self.rate_unit = u;
        }
        if let Some(ms) = overrides.advance_delay_ms {
            self.advance_delay_ms = ms;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chars_per_page == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.default_text.trim().is_empty() {
            return Err(ConfigError::BlankDefaultText);
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chars_per_page: self.chars_per_page,
            advance_delay: Duration::from_millis(self.advance_delay_ms),
            rate_unit: self.rate_unit,
            default_text: self.default_text.clone(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "pagetype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("pagetype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            chars_per_page: 200,
            difficulty: Difficulty::Hard,
            rate_unit: RateUnit::Wpm,
            advance_delay_ms: 0,
            default_text: "custom practice text".into(),
            provider: ProviderConfig {
                max_body_chars: None,
                ..ProviderConfig::default()
            },
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "chars_per_page": 200, "rate_unit": "wpm" }"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.chars_per_page, 200);
        assert_eq!(loaded.rate_unit, RateUnit::Wpm);
        assert_eq!(loaded.difficulty, Difficulty::Medium);
        assert_eq!(loaded.provider, ProviderConfig::default());
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = Config::default().apply(&ConfigOverrides {
            chars_per_page: Some(80),
            difficulty: Some(Difficulty::Easy),
            rate_unit: None,
            advance_delay_ms: Some(0),
        });

        assert_eq!(cfg.chars_per_page, 80);
        assert_eq!(cfg.difficulty, Difficulty::Easy);
        assert_eq!(cfg.rate_unit, RateUnit::Cpm);
        assert_eq!(cfg.session_config().advance_delay, Duration::ZERO);
    }

    #[test]
    fn validation() {
        assert_eq!(Config::default().validate(), Ok(()));

        let zero = Config {
            chars_per_page: 0,
            ..Config::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroPageSize));

        let blank = Config {
            default_text: " \n ".into(),
            ..Config::default()
        };
        assert_eq!(blank.validate(), Err(ConfigError::BlankDefaultText));
    }
}
