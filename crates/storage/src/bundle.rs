//! Lookup of read-only resources shipped with the application.

use std::path::PathBuf;

/// Resolves bundled resources by name and extension.
pub trait ResourceBundle: Send + Sync {
    /// Path of `<name>.<ext>` if the bundle contains it.
    fn resolve(&self, name: &str, ext: &str) -> Option<PathBuf>;
}

/// A bundle backed by a plain directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceBundle for DirectoryBundle {
    fn resolve(&self, name: &str, ext: &str) -> Option<PathBuf> {
        let path = self.root.join(format!("{name}.{ext}"));
        path.is_file().then_some(path)
    }
}
