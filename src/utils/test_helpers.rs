use std::sync::Once;

use crate::core::{LocalFile, LocalFileMetadata, LocalFileType, TreeNode};

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// This function is wrapped in a `Once` block to ensure that the global
/// subscriber is set exactly one time, even when tests are run in parallel.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok(); // Ignore the error if it's already set by another test.
    });
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn local_file(path: &str, media_id: i64) -> LocalFile {
    LocalFile {
        path: path.to_string(),
        name: leaf_name(path).to_string(),
        media_id,
        locked: false,
        ignored: false,
        metadata: LocalFileMetadata::default(),
    }
}

/// A directory node named after the last segment of `path`.
pub fn dir(path: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode::directory(path, leaf_name(path), children)
}

/// A file on disk that was never scanned.
pub fn unscanned_file(path: &str) -> TreeNode {
    TreeNode::file(path, leaf_name(path))
}

/// A scanned file not matched to any media.
pub fn scanned_file(path: &str) -> TreeNode {
    unscanned_file(path).with_local_file(local_file(path, 0))
}

/// A scanned file matched to `media_id`, not locked.
pub fn matched_file(path: &str, media_id: i64) -> TreeNode {
    unscanned_file(path).with_local_file(local_file(path, media_id))
}

/// A scanned file matched to `media_id` and locked.
pub fn locked_file(path: &str, media_id: i64) -> TreeNode {
    let mut lf = local_file(path, media_id);
    lf.locked = true;
    unscanned_file(path).with_local_file(lf)
}

/// A scanned, unmatched file marked as ignored.
pub fn ignored_file(path: &str) -> TreeNode {
    let mut lf = local_file(path, 0);
    lf.ignored = true;
    unscanned_file(path).with_local_file(lf)
}

/// A scanned, unmatched file carrying the given episode metadata.
pub fn file_with_metadata(
    path: &str,
    episode: u32,
    anidb_episode: &str,
    file_type: LocalFileType,
) -> TreeNode {
    let mut lf = local_file(path, 0);
    lf.metadata = LocalFileMetadata {
        episode,
        anidb_episode: anidb_episode.to_string(),
        file_type,
    };
    unscanned_file(path).with_local_file(lf)
}
