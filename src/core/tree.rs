//! Traversal helpers over the immutable tree snapshot.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{LocalFile, TreeNode, TreeSnapshot};

/// Collects the paths of all files in the node's subtree, in pre-order.
///
/// A file node yields its own path.
pub fn collect_file_paths(node: &TreeNode) -> Vec<String> {
    collect_file_nodes(node)
        .into_iter()
        .map(|n| n.path.clone())
        .collect()
}

/// Collects every file node in the subtree, in pre-order traversal order.
pub fn collect_file_nodes(node: &TreeNode) -> Vec<&TreeNode> {
    fn walk<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
        if node.is_file() {
            out.push(node);
            return;
        }
        for child in &node.children {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    walk(node, &mut out);
    out
}

/// Resolves `paths` to the file nodes under `root`, in the order given.
///
/// Paths that are missing or name a directory are skipped. The tree is walked
/// once regardless of how many paths are asked for.
pub fn file_nodes_by_path<'a>(root: &'a TreeNode, paths: &[String]) -> Vec<&'a TreeNode> {
    let index: HashMap<&str, &TreeNode> = collect_file_nodes(root)
        .into_iter()
        .map(|node| (node.path.as_str(), node))
        .collect();
    paths
        .iter()
        .filter_map(|path| index.get(path.as_str()).copied())
        .collect()
}

/// Finds a node by exact path.
pub fn find_node<'a>(node: &'a TreeNode, path: &str) -> Option<&'a TreeNode> {
    if node.path == path {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_node(child, path))
}

/// Finds a node by path, ignoring case, and returns it with its ancestor paths (root first).
pub fn find_node_and_parents<'a>(
    node: &'a TreeNode,
    path: &str,
) -> Option<(&'a TreeNode, Vec<String>)> {
    fn walk<'a>(
        node: &'a TreeNode,
        target: &str,
        parents: &mut Vec<String>,
    ) -> Option<&'a TreeNode> {
        if node.path.to_lowercase() == target {
            return Some(node);
        }
        parents.push(node.path.clone());
        for child in &node.children {
            if let Some(found) = walk(child, target, parents) {
                return Some(found);
            }
        }
        parents.pop();
        None
    }

    let target = path.to_lowercase();
    let mut parents = Vec::new();
    walk(node, &target, &mut parents).map(|found| (found, parents))
}

/// Returns the scanned, unmatched records under a node, for the matching dialog.
pub fn match_candidates(node: &TreeNode) -> Vec<LocalFile> {
    collect_file_nodes(node)
        .into_iter()
        .filter_map(|n| n.local_file.as_ref())
        .filter(|lf| !lf.is_matched())
        .cloned()
        .collect()
}

/// Returns every record in the snapshot's flat map matched to `media_id`, sorted by path.
pub fn local_files_for_media(snapshot: &TreeSnapshot, media_id: i64) -> Vec<LocalFile> {
    let mut files: Vec<LocalFile> = snapshot
        .local_files
        .values()
        .filter(|lf| lf.media_id == media_id)
        .cloned()
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Counters shown as quick-filter shortcuts above the explorer.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LibrarySummary {
    pub has_unscanned_files: bool,
    pub has_unlocked_files: bool,
    pub unmatched_count: usize,
    pub unknown_media_count: usize,
}

impl LibrarySummary {
    /// Computes the counters over all non-ignored files of the tree.
    pub fn compute(root: &TreeNode, known_media: &HashSet<i64>) -> Self {
        let files: Vec<&TreeNode> = collect_file_nodes(root)
            .into_iter()
            .filter(|n| !n.local_file.as_ref().is_some_and(|lf| lf.ignored))
            .collect();

        let has_unscanned_files = files.par_iter().any(|n| n.local_file.is_none());
        let scanned: Vec<&LocalFile> = files.iter().filter_map(|n| n.local_file.as_ref()).collect();

        Self {
            has_unscanned_files,
            has_unlocked_files: scanned.par_iter().any(|lf| lf.is_matched() && !lf.locked),
            unmatched_count: scanned.par_iter().filter(|lf| !lf.is_matched()).count(),
            unknown_media_count: scanned
                .par_iter()
                .filter(|lf| lf.is_matched() && !known_media.contains(&lf.media_id))
                .count(),
        }
    }
}

/// Aggregate status of a node's descendant files, used for directory rows.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeStatus {
    /// Number of non-ignored files.
    pub file_count: usize,
    /// Number of non-ignored files matched to a media.
    pub matched_file_count: usize,
    pub all_ignored: bool,
    pub all_scanned: bool,
    /// Every non-ignored file is locked or not yet scanned.
    pub is_locked: bool,
}

impl NodeStatus {
    pub fn compute(node: &TreeNode) -> Self {
        let files = collect_file_nodes(node);
        let non_ignored: Vec<&TreeNode> = files
            .iter()
            .copied()
            .filter(|n| !n.local_file.as_ref().is_some_and(|lf| lf.ignored))
            .collect();

        Self {
            file_count: non_ignored.len(),
            matched_file_count: non_ignored
                .iter()
                .filter(|n| n.local_file.as_ref().is_some_and(|lf| lf.is_matched()))
                .count(),
            all_ignored: files
                .iter()
                .all(|n| n.local_file.as_ref().is_some_and(|lf| lf.ignored)),
            all_scanned: non_ignored.iter().all(|n| n.local_file.is_some()),
            is_locked: non_ignored
                .iter()
                .all(|n| n.local_file.as_ref().is_none_or(|lf| lf.locked)),
        }
    }
}
