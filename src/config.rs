//! Tracker configuration (`lexis.toml`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encounters::DEFAULT_UNLOCK_THRESHOLD;
use crate::error::{Result, TrackerError};
use crate::store::{StoreError, DEFAULT_SHARDS};
use crate::vocabulary::DEFAULT_FOCUS_WORD_LIMIT;

/// Config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "lexis.toml";

/// Which row store engine to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database file
    #[default]
    Sqlite,
    /// Nothing persisted
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file, relative to the data directory unless absolute
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("lexis.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncounterConfig {
    /// Encounters before a definition unlocks without an explicit action
    pub unlock_threshold: u32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            unlock_threshold: DEFAULT_UNLOCK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Maximum focus words in a production-gap report
    pub focus_word_limit: usize,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            focus_word_limit: DEFAULT_FOCUS_WORD_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LockConfig {
    /// Lock shards per component
    pub shards: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
        }
    }
}

/// Top-level tracker configuration. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base directory for relative paths; not read from the file
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub storage: StorageConfig,
    pub encounters: EncounterConfig,
    pub vocabulary: VocabularyConfig,
    pub locks: LockConfig,
}

impl TrackerConfig {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("lexis"))
            .ok_or_else(|| TrackerError::InvalidInput("no local data directory available".to_string()))
    }

    /// Load `lexis.toml` from the data directory, defaults if it doesn't exist
    pub fn load_from_data_dir(data_dir: &Path) -> Result<Self> {
        Self::load(&data_dir.join(CONFIG_FILE_NAME), data_dir)
    }

    /// Load a config file, defaults if it doesn't exist
    pub fn load(config_path: &Path, data_dir: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(config_path).map_err(StoreError::from)?;
            toml::from_str::<TrackerConfig>(&content).map_err(|e| {
                TrackerError::InvalidInput(format!("{}: {}", config_path.display(), e))
            })?
        } else {
            log::debug!("No config at {}, using defaults", config_path.display());
            TrackerConfig::default()
        };

        config.data_dir = data_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Save to `lexis.toml` in the data directory
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(StoreError::from)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrackerError::InvalidInput(format!("config serialization failed: {}", e)))?;
        fs::write(self.data_dir.join(CONFIG_FILE_NAME), content).map_err(StoreError::from)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.encounters.unlock_threshold == 0 {
            return Err(TrackerError::InvalidInput(
                "encounters.unlock_threshold must be at least 1".to_string(),
            ));
        }
        if self.vocabulary.focus_word_limit == 0 {
            return Err(TrackerError::InvalidInput(
                "vocabulary.focus_word_limit must be at least 1".to_string(),
            ));
        }
        if self.locks.shards == 0 {
            return Err(TrackerError::InvalidInput(
                "locks.shards must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved database path
    pub fn database_path(&self) -> PathBuf {
        if self.storage.path.is_absolute() {
            self.storage.path.clone()
        } else {
            self.data_dir.join(&self.storage.path)
        }
    }
}
