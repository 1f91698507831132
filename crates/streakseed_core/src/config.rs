//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve data directory, log level and log directory from the environment.
//!
//! # Invariants
//! - Invalid or empty values are ignored in favour of defaults.
//! - Resolved directories are absolute, as required by `init_logging`.

use crate::logging::{default_log_level, normalize_level};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "STREAKSEED_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "STREAKSEED_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STREAKSEED_LOG_DIR";

const DEFAULT_DATA_DIR: &str = ".streakseed";
const LOG_SUBDIR: &str = "logs";
const DATABASE_FILE_NAME: &str = "streakseed.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = absolutize(Path::new(DEFAULT_DATA_DIR));
        Self {
            log_dir: data_dir.join(LOG_SUBDIR),
            data_dir,
            log_level: default_log_level(),
        }
    }
}

impl CoreConfig {
    /// Reads `STREAKSEED_DATA_DIR`, `STREAKSEED_LOG_LEVEL` and
    /// `STREAKSEED_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = read(DATA_DIR_ENV)
            .map(|value| absolutize(Path::new(value.trim())))
            .unwrap_or_else(|| absolutize(Path::new(DEFAULT_DATA_DIR)));
        let log_dir = read(LOG_DIR_ENV)
            .map(|value| absolutize(Path::new(value.trim())))
            .unwrap_or_else(|| data_dir.join(LOG_SUBDIR));
        let log_level = read(LOG_LEVEL_ENV)
            .and_then(|value| normalize_level(&value).ok())
            .unwrap_or_else(default_log_level);

        Self {
            data_dir,
            log_level,
            log_dir,
        }
    }

    /// Overrides the data directory; the log directory follows unless it was
    /// set explicitly.
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        let default_log_dir = self.data_dir.join(LOG_SUBDIR);
        self.data_dir = absolutize(data_dir.as_ref());
        if self.log_dir == default_log_dir {
            self.log_dir = self.data_dir.join(LOG_SUBDIR);
        }
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
