//! The persistence collaborator the explorer hands its changes to.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::super_update::SuperUpdateFile;

/// A bulk action on tracked local files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalFileAction {
    Lock,
    Unlock,
    Ignore,
    Unignore,
    Unmatch,
}

/// Defines the library operations the explorer issues.
///
/// The explorer does not retry or roll back; a returned error is reported to
/// the user and the next snapshot refresh shows the real state.
pub trait LibraryService: Send + Sync {
    /// Applies `action` to every path.
    fn update_local_files(&self, paths: Vec<String>, action: LocalFileAction) -> Result<()>;

    /// Deletes the files from disk and the library.
    fn delete_local_files(&self, paths: Vec<String>) -> Result<()>;

    /// Renames files and rewrites their metadata in one call.
    fn super_update_local_files(&self, files: Vec<SuperUpdateFile>) -> Result<()>;
}
