//! Persistent configuration
//!
//! A small TOML file holding the user's defaults. Writes go through a
//! temp-file-and-rename so a crash mid-write never leaves a truncated file.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Provider id to use when none is given on the command line.
    pub default_provider: Option<String>,
    /// Model id to use when none is given on the command line.
    pub default_model: Option<String>,
    /// UI theme name (e.g., "dark", "light")
    pub theme: Option<String>,
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path_display(path),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&get_config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn StdError>> {
        self.save_to_path(&get_config_path())
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn StdError>> {
        let contents = toml::to_string_pretty(self)?;
        write_atomically(config_path, contents.as_bytes())
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.default_provider {
            Some(provider) => println!("  default-provider: {provider}"),
            None => println!("  default-provider: (unset)"),
        }
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset)"),
        }
        match &self.theme {
            Some(theme) => println!("  theme: {theme}"),
            None => println!("  theme: (unset)"),
        }
    }
}

/// Write `contents` to `path` via a sibling temp file and an atomic rename.
/// Shared by the config and conversation stores.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), Box<dyn StdError>> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };

    temp_file.write_all(contents)?;
    temp_file.as_file_mut().sync_all()?;
    temp_file
        .persist(path)
        .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
    Ok(())
}

fn project_dirs() -> ProjectDirs {
    ProjectDirs::from("org", "chinwag", "chinwag").expect("Failed to determine config directory")
}

pub fn get_config_path() -> PathBuf {
    project_dirs().config_dir().join("config.toml")
}

/// Directory holding the persisted conversation and the optional debug log.
pub fn get_data_dir() -> PathBuf {
    project_dirs().data_dir().to_path_buf()
}

/// Display a path with the home directory abbreviated to `~` on Unix.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
