use crate::config::schema::{RegistryConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read language config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse language config TOML: {0}")]
    Toml(#[from] toml_edit::de::Error),

    #[error("invalid language config: {0}")]
    Validation(#[from] ValidationError),

    #[error("{source} ({})", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    fn in_file(self, path: &Path) -> Self {
        ConfigError::InFile {
            path: path.to_path_buf(),
            source: Box::new(self),
        }
    }

    /// File the error came from, when loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::InFile { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The error without its file context.
    pub fn kind(&self) -> &ConfigError {
        match self {
            ConfigError::InFile { source, .. } => source.kind(),
            other => other,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RegistryConfig, ConfigError> {
    let config: RegistryConfig = toml_edit::de::from_str(input)?;
    config.validate()?;
    tracing::debug!(languages = config.languages.len(), "loaded language config");
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RegistryConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::from(err).in_file(path))?;
    load_from_str(&contents).map_err(|err| err.in_file(path))
}
