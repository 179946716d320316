//! Document stores: where the editor loads a document from and saves it to.
//!
//! [`LocalVault`] reads and writes a vault directory directly;
//! [`HttpStore`] talks to a vault server over its document API.

mod http;
mod local;

pub use http::HttpStore;
pub use local::LocalVault;

use std::path::Path;

use crate::error::StoreError;

/// File extensions a vault treats as documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "chat"];

/// Loads and saves documents by vault-relative path.
///
/// Implementations are shared with the background save worker, so they
/// must be usable from another thread.
pub trait DocumentStore: Send + Sync {
    /// Fetch the document's current content.
    ///
    /// # Errors
    ///
    /// Fails with a [`StoreError`] when the document cannot be read.
    fn load(&self, path: &str) -> Result<String, StoreError>;

    /// Overwrite an existing document with `content`.
    ///
    /// # Errors
    ///
    /// Fails with a [`StoreError`] when the document does not exist or
    /// cannot be written.
    fn save(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Where documents live, for status lines.
    fn location(&self) -> String;
}

/// Whether `path` has a document extension.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_extensions() {
        assert!(is_document(Path::new("notes/today.md")));
        assert!(is_document(Path::new("thread.chat")));
        assert!(!is_document(Path::new("image.png")));
        assert!(!is_document(Path::new("README")));
    }
}
