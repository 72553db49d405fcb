use std::path::Path;

use anyhow::{Context, Result};

use lexis_lib::{Tracker, TrackerConfig};

/// Shared application state for CLI commands
pub struct App {
    pub tracker: Tracker,
    pub config: TrackerConfig,
    pub user_id: String,
}

impl App {
    /// Load config and open the tracker
    pub fn new(data_dir: Option<&Path>, config_path: Option<&Path>, user_id: &str) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => TrackerConfig::default_data_dir().context("Failed to get data directory")?,
        };

        let config = match config_path {
            Some(path) => TrackerConfig::load(path, &data_dir),
            None => TrackerConfig::load_from_data_dir(&data_dir),
        }
        .context("Failed to load config")?;

        let tracker = Tracker::open(&config).context("Failed to open tracker store")?;
        log::debug!("Opened tracker in {}", data_dir.display());

        Ok(Self {
            tracker,
            config,
            user_id: user_id.to_string(),
        })
    }
}
