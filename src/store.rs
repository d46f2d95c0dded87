use crate::error::{ModError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where manifest files are read from and written to.
pub trait FileStore {
    /// Read a whole file. A missing or unreadable file is `ManifestNotFound`.
    fn read(&self, path: &Path) -> Result<String>;

    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

/// The local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn read(&self, path: &Path) -> Result<String> {
        let not_found = |source| ModError::ManifestNotFound {
            path: path.to_path_buf(),
            source,
        };
        let mut file = std::fs::File::open(path).map_err(not_found)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(not_found)?;
        Ok(contents)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        let failed = |source| ModError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
        std::fs::write(path, contents).map_err(failed)
    }
}

/// Files held in memory, keyed by their full path.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    files: HashMap<PathBuf, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ModError::ManifestNotFound {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
