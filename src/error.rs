use crate::document::DocumentError;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle state of a [`Mod`](crate::Mod), carried by the guard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModState {
    Uninitialized,
    ReadOnly,
    Editable,
}

impl std::fmt::Display for ModState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModState::Uninitialized => "uninitialized",
            ModState::ReadOnly => "read-only",
            ModState::Editable => "editable",
        };
        f.write_str(s)
    }
}

/// Every error the mod model can surface.
#[derive(Debug, Error)]
pub enum ModError {
    #[error("can't {operation}: mod is already {state}")]
    AlreadyInitialized {
        operation: &'static str,
        state: ModState,
    },

    #[error("can't {operation}: no mod has been created or loaded yet")]
    Uninitialized { operation: &'static str },

    #[error("can't {operation}: mod was loaded from disk and isn't a clone")]
    ReadOnly { operation: &'static str },

    #[error("manifest not found at {path:?}: {source}")]
    ManifestNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest {path:?} is not well-formed XML: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("manifest {path:?} is malformed: {message}")]
    ManifestFormat { path: PathBuf, message: String },

    #[error("couldn't serialize {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: DocumentError,
    },

    #[error("couldn't write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ModError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ModError::ManifestFormat {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModError>;
