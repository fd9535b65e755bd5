use std::path::{Path, PathBuf};

use tracing::warn;

/// Resolves (task_id, filename) pairs to files under the workspace
/// root. Purely filesystem-backed: a task exists exactly as long as
/// its directory does.
pub struct ArtifactRegistry {
    root: PathBuf,
}

impl ArtifactRegistry {
    /// Create a registry over the same root the downloader writes to.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a retrieval request to an existing file.
    ///
    /// Returns `None` for unknown ids, missing files, and any
    /// identifier that could escape the root — unsafe input is a
    /// not-found, never an error.
    pub fn lookup(&self, task_id: &str, filename: &str) -> Option<PathBuf> {
        if !is_safe_component(task_id) || !is_safe_component(filename) {
            warn!(task_id, filename, "rejected unsafe retrieval identifier");
            return None;
        }

        let path = self.root.join(task_id).join(filename);
        path.is_file().then_some(path)
    }
}

/// A single plain path component: no separators, no traversal, not
/// empty.
fn is_safe_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains('/')
        && !s.contains('\\')
        && !s.contains('\0')
}
