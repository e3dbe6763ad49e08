//! Defines the custom error type for the `core` module.

use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Most of the core is pure transformation, so this stays small. Invalid
/// user patterns are usually recovered from where they occur and only
/// surface through this type when a caller asks for the compiled pattern.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A user-supplied search pattern could not be compiled.
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A batch update was submitted but no item would change.
    #[error("No valid changes to apply. Please check your settings.")]
    NothingToApply,

    /// A path was requested that does not exist in the current snapshot.
    #[error("No node found for path: {0}")]
    NodeNotFound(String),

    /// The tree snapshot payload could not be parsed.
    #[error("Invalid tree snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
