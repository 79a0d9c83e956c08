use crate::script::schema::{RewriteScript, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl LoadError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            LoadError::Toml { path: None, source } => LoadError::Toml {
                path: Some(path),
                source,
            },
            LoadError::Validation { path: None, source } => LoadError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(
                    f,
                    "failed to read rewrite script from {}: {}",
                    path.display(),
                    source
                )
            }
            LoadError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rewrite script TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rewrite script TOML: {}", source),
            },
            LoadError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rewrite script ({}): {}", path.display(), source),
                None => write!(f, "invalid rewrite script: {}", source),
            },
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Toml { source, .. } => Some(source),
            LoadError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RewriteScript, LoadError> {
    let script: RewriteScript =
        toml_edit::de::from_str(input).map_err(|source| LoadError::Toml { path: None, source })?;
    script
        .validate()
        .map_err(|source| LoadError::Validation { path: None, source })?;
    Ok(script)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RewriteScript, LoadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
