use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{MatrixError, MatrixResult};
use crate::model::{FooterMeta, HeaderMeta};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SKILL_MATRIX_CONFIG";
/// Environment variable overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "SKILL_MATRIX_DATA_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "skill-matrix.json";

/// Application settings, read from a JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Where saved matrices are written.
    pub data_dir: PathBuf,
    /// JSON fixture with departments, lines and stations.
    pub directory_file: PathBuf,
    /// Overrides the level labels from the directory when non-empty.
    pub level_labels: Vec<String>,
    pub header: HeaderMeta,
    pub footer: FooterMeta,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            directory_file: PathBuf::from("directory.json"),
            level_labels: Vec::new(),
            header: HeaderMeta::default(),
            footer: FooterMeta::default(),
        }
    }
}

impl AppConfig {
    /// Read a config file. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> MatrixResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!("reading config from {}", path.display());
                serde_json::from_str(&text)
                    .map_err(|e| MatrixError::Config(format!("{}: {}", path.display(), e)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the config named by the environment, then apply overrides.
    pub fn from_env() -> MatrixResult<Self> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load(path)?;
        if let Some(dir) = env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}
