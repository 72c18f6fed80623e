use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "base_url")]
    pub url: Option<String>,
    pub collection: Option<String>,
    pub cache_dir: Option<String>,
    pub cache_key: Option<String>,
    pub no_cache: Option<bool>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub max_pages: Option<usize>,
    pub input_id: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found '{path}'")]
    NotFound { path: String },

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigError::NotFound {
                path: shown.clone(),
            },
            _ => ConfigError::Read {
                path: shown.clone(),
                source,
            },
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: shown,
            source,
        })
    }

    /// Like [`ConfigFile::load`], but a missing file yields the empty config.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }
}

/// `~/.astrosearch`
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".astrosearch"))
}

pub fn default_config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.yml"))
}

pub fn default_cache_dir() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("cache"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().into_owned()
}

fn default_config_yaml() -> String {
    r#"# astrosearch config
#
# Location (default):
#   ~/.astrosearch/config.yml

# Catalogue site (or a full collection URL)
# url: https://gc.example.org/
# collection: /api/v1/catalogue/astro_object/

# Name index cache
# cache_dir: ~/.astrosearch/cache
cache_key: astroObjectNames
no_cache: false

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080
# header: "Authorization: Token abc"
# max_pages: 500

# Autocomplete
input_id: globalSearch

# Output
output_format: text
no_color: false
"#
    .to_string()
}

/// Writes the commented default config unless a file already exists.
/// Returns whether a file was created.
pub fn write_default_config(path: &Path) -> Result<bool, ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_err(e)),
    };
    file.write_all(default_config_yaml().as_bytes())
        .map_err(write_err)?;
    Ok(true)
}
