// Runtime configuration: where the settings database and profile image live
//
// Resolved once at startup. `RIDEROAD_HOME` overrides the data directory;
// otherwise everything sits under `./.rideroad`.

use std::env;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "RIDEROAD_HOME";
pub const DEFAULT_DATA_DIR: &str = ".rideroad";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub profile_image_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_file: "rideroad.db".to_string(),
            profile_image_file: "profile.png".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_home(env::var_os(HOME_ENV).map(PathBuf::from))
    }

    /// Defaults, with the data directory replaced when `home` is set and non-empty
    pub fn from_home(home: Option<PathBuf>) -> Self {
        let mut config = AppConfig::default();
        if let Some(home) = home.filter(|h| !h.as_os_str().is_empty()) {
            config.data_dir = home;
        }
        config
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn profile_image_path(&self) -> PathBuf {
        self.data_dir.join(&self.profile_image_file)
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}
