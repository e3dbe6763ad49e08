//! Defines the central, mutable state of the explorer.

use std::collections::HashSet;
use tokio::task::JoinHandle;

use super::expansion::ExpansionModel;
use super::selection::SelectionModel;
use crate::config::ExplorerConfig;
use crate::core::flatten::{flatten_tree, FlattenOptions};
use crate::core::super_update::SuperUpdateOptions;
use crate::core::{Filter, FlattenedItem, TreeNode, TreeSnapshot};

/// The open batch update panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperUpdatePanel {
    /// Selected file paths in the order they had when the panel opened.
    pub file_paths: Vec<String>,
    pub options: SuperUpdateOptions,
}

/// Holds the complete, mutable state of the explorer.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow shared access from
/// the host's command handlers and the background sweep task.
pub struct ExplorerState {
    pub config: ExplorerConfig,
    /// The last snapshot delivered by the library service.
    pub snapshot: TreeSnapshot,
    /// Media ids the user owns, used by the unknown-media filter.
    pub known_media: HashSet<i64>,
    /// The search text as typed.
    pub search_term: String,
    pub filter: Option<Filter>,
    pub selection: SelectionModel,
    pub expansion: ExpansionModel,
    /// `true` while checkboxes are shown.
    pub is_selecting: bool,
    /// The highlighted node.
    pub selected_node: Option<String>,
    pub super_update: Option<SuperUpdatePanel>,
    /// The pending cascade-collapse sweep, if any.
    pub collapse_task: Option<JoinHandle<()>>,
    /// Bumped on every expansion change so a superseded sweep can tell.
    pub collapse_generation: u64,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}

impl ExplorerState {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            snapshot: TreeSnapshot::default(),
            known_media: HashSet::new(),
            search_term: String::new(),
            filter: None,
            selection: SelectionModel::default(),
            expansion: ExpansionModel::default(),
            is_selecting: false,
            selected_node: None,
            super_update: None,
            collapse_task: None,
            collapse_generation: 0,
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.snapshot.root.as_ref()
    }

    /// The visible rows for the current tree, search, filter and expansion.
    pub fn flatten(&self) -> Vec<FlattenedItem<'_>> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let search_term = self.search_term.trim().to_lowercase();
        let options = FlattenOptions {
            expanded: self.expansion.paths(),
            search_term: &search_term,
            filter: self.filter,
            known_media: &self.known_media,
        };
        flatten_tree(root, &options)
    }

    /// The selected file nodes of the current snapshot, in tree order.
    pub fn selected_file_nodes(&self) -> Vec<&TreeNode> {
        self.root()
            .map(|root| self.selection.selected_file_nodes(root))
            .unwrap_or_default()
    }

    /// Enters or leaves selection mode. Leaving clears the selection.
    pub fn set_selecting(&mut self, selecting: bool) {
        self.is_selecting = selecting;
        if !selecting {
            self.selection.clear();
        }
    }

    /// Aborts the pending sweep, if any.
    pub fn cancel_collapse_sweep(&mut self) {
        if let Some(handle) = self.collapse_task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{dir, unscanned_file};
    use std::collections::HashMap;

    fn state_with_tree() -> ExplorerState {
        let mut state = ExplorerState::default();
        state.snapshot = TreeSnapshot::new(
            dir(
                "/lib",
                vec![
                    dir("/lib/Show", vec![unscanned_file("/lib/Show/Show - 01.mkv")]),
                    unscanned_file("/lib/movie.mkv"),
                ],
            ),
            HashMap::new(),
        );
        state
    }

    #[test]
    fn test_flatten_without_snapshot_is_empty() {
        assert!(ExplorerState::default().flatten().is_empty());
    }

    #[test]
    fn test_flatten_lowercases_the_search_term() {
        let mut state = state_with_tree();
        state.expansion.expand(["/lib".to_string(), "/lib/Show".to_string()]);
        state.search_term = "  SHOW ".to_string();

        let names: Vec<&str> = state.flatten().iter().map(|i| i.node.name.as_str()).collect();
        assert_eq!(names, vec!["lib", "Show", "Show - 01.mkv"]);
    }

    #[test]
    fn test_leaving_selection_mode_clears_selection() {
        let mut state = state_with_tree();
        state.set_selecting(true);
        state.selection.replace(["/lib/movie.mkv".to_string()]);
        assert_eq!(state.selected_file_nodes().len(), 1);

        state.set_selecting(false);
        assert!(state.selection.is_empty());
    }
}
