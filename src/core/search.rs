//! Predicates used to decide which tree nodes survive searching and filtering.

use super::{Filter, TreeNode};
use std::collections::HashSet;

/// A utility struct holding the explorer's name and category predicates.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Checks if a node's name, or the name of any descendant, contains the search term.
    ///
    /// The term is expected to be lower-cased already.
    pub fn node_or_descendant_matches(node: &TreeNode, search_term: &str) -> bool {
        if Self::name_matches(node, search_term) {
            return true;
        }
        node.children
            .iter()
            .any(|child| Self::node_or_descendant_matches(child, search_term))
    }

    /// Checks if the node's own name contains the lower-cased search term.
    pub fn name_matches(node: &TreeNode, search_term: &str) -> bool {
        node.name.to_lowercase().contains(search_term)
    }

    /// Checks a single file against a category filter.
    ///
    /// Directories never match here; use [`SearchEngine::has_matching_files`] for them.
    pub fn file_matches_filter(node: &TreeNode, filter: Filter, known_media: &HashSet<i64>) -> bool {
        if node.is_directory() {
            return false;
        }
        let Some(local_file) = node.local_file.as_ref() else {
            return false;
        };

        match filter {
            Filter::Unmatched => !local_file.is_matched() && !local_file.ignored,
            Filter::Unlocked => local_file.is_matched() && !local_file.locked && !local_file.ignored,
            Filter::Ignored => local_file.ignored,
            Filter::UnknownMedia => {
                local_file.is_matched()
                    && !local_file.ignored
                    && !known_media.contains(&local_file.media_id)
            }
        }
    }

    /// Checks if any file in the node's subtree matches the category filter.
    ///
    /// This ignores expansion state and the search term entirely.
    pub fn has_matching_files(node: &TreeNode, filter: Filter, known_media: &HashSet<i64>) -> bool {
        if node.is_file() {
            return Self::file_matches_filter(node, filter, known_media);
        }
        node.children
            .iter()
            .any(|child| Self::has_matching_files(child, filter, known_media))
    }

    /// Decides whether a child survives the category filter during flattening.
    ///
    /// Directories pass when something below them matches; files are checked directly.
    pub fn child_passes_filter(child: &TreeNode, filter: Filter, known_media: &HashSet<i64>) -> bool {
        if child.is_directory() {
            Self::has_matching_files(child, filter, known_media)
        } else {
            Self::file_matches_filter(child, filter, known_media)
        }
    }
}
