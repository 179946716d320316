use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{DocumentStore, is_document};
use crate::error::StoreError;

/// A vault directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalVault {
    root: PathBuf,
}

impl LocalVault {
    /// Open the vault rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails when `root` does not exist or is not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|source| StoreError::Io {
            path: root.display().to_string(),
            source,
        })?;
        if !root.is_dir() {
            return Err(StoreError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault-relative path, refusing anything that would land
    /// outside the vault.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidPath`] for absolute paths, `..` escapes and
    /// symlinks pointing out of the vault.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let invalid = || StoreError::InvalidPath(relative.to_string());
        let mut resolved = self.root.clone();
        let mut depth = 0_usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(invalid());
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return Err(invalid()),
            }
        }
        if resolved.exists() {
            let canonical = fs::canonicalize(&resolved).map_err(|source| StoreError::Io {
                path: relative.to_string(),
                source,
            })?;
            if !canonical.starts_with(&self.root) {
                return Err(invalid());
            }
            return Ok(canonical);
        }
        Ok(resolved)
    }

    /// Resolve `relative` to an existing document file.
    fn document(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(relative.to_string()));
        }
        if !is_document(&path) {
            return Err(StoreError::UnsupportedFileType(relative.to_string()));
        }
        Ok(path)
    }
}

impl DocumentStore for LocalVault {
    fn load(&self, path: &str) -> Result<String, StoreError> {
        let file = self.document(path)?;
        debug!(path, "loading document from vault");
        fs::read_to_string(&file).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })
    }

    fn save(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let file = self.document(path)?;
        debug!(path, bytes = content.len(), "saving document to vault");
        fs::write(&file, content).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
