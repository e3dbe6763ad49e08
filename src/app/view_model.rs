//! Responsible for transforming the `ExplorerState` into an `ExplorerView`.
//!
//! This module acts as a presentation layer: it flattens the tree into rows,
//! decorates them with selection and status information, and computes the
//! batch preview while the update panel is open.

use serde::Serialize;

use super::selection::{CheckboxState, SelectionActions};
use super::state::ExplorerState;
use crate::core::super_update::{self, PreviewItem, SuperUpdateOptions};
use crate::core::tree::{file_nodes_by_path, NodeStatus};
use crate::core::{Filter, FlattenedItem, LibrarySummary, LocalFile, NodeKind, TreeNode};

/// A serializable representation of the explorer for the UI.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerView {
    pub rows: Vec<RowView>,
    pub summary: LibrarySummary,
    pub search_term: String,
    pub filter: Option<Filter>,
    pub is_selecting: bool,
    pub selected_count: usize,
    pub selection_actions: SelectionActions,
    pub selected_node: Option<String>,
    pub super_update: Option<SuperUpdateView>,
}

/// One visible row of the tree.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    pub level: usize,
    pub index: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    pub is_highlighted: bool,
    /// Present only in selection mode.
    pub checkbox: Option<CheckboxState>,
    /// Aggregate state of the files below a directory.
    pub status: Option<NodeStatus>,
    pub local_file: Option<LocalFile>,
}

/// The open batch update panel with its live preview.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SuperUpdateView {
    pub options: SuperUpdateOptions,
    pub items: Vec<PreviewItem>,
    pub changed_count: usize,
}

/// Creates the complete `ExplorerView` from the current `ExplorerState`.
pub fn generate_explorer_view(state: &ExplorerState) -> ExplorerView {
    let Some(root) = state.root() else {
        return ExplorerView {
            search_term: state.search_term.clone(),
            filter: state.filter,
            is_selecting: state.is_selecting,
            super_update: generate_super_update_view(state),
            ..Default::default()
        };
    };

    let rows = state
        .flatten()
        .iter()
        .map(|item| build_row(item, state))
        .collect();
    let selected_nodes = state.selected_file_nodes();

    ExplorerView {
        rows,
        summary: LibrarySummary::compute(root, &state.known_media),
        search_term: state.search_term.clone(),
        filter: state.filter,
        is_selecting: state.is_selecting,
        selected_count: selected_nodes.len(),
        selection_actions: SelectionActions::compute(&selected_nodes),
        selected_node: state.selected_node.clone(),
        super_update: generate_super_update_view(state),
    }
}

fn build_row(item: &FlattenedItem<'_>, state: &ExplorerState) -> RowView {
    let node = item.node;
    RowView {
        path: node.path.clone(),
        name: node.name.clone(),
        kind: node.kind,
        level: item.level,
        index: item.index,
        has_children: node.has_children(),
        is_expanded: node.is_directory() && state.expansion.is_expanded(&node.path),
        is_highlighted: state.selected_node.as_deref() == Some(node.path.as_str()),
        checkbox: state
            .is_selecting
            .then(|| state.selection.checkbox_state(node)),
        status: node.is_directory().then(|| NodeStatus::compute(node)),
        local_file: node.local_file.clone(),
    }
}

fn generate_super_update_view(state: &ExplorerState) -> Option<SuperUpdateView> {
    let panel = state.super_update.as_ref()?;
    let nodes: Vec<&TreeNode> = match state.root() {
        Some(root) => file_nodes_by_path(root, &panel.file_paths),
        None => Vec::new(),
    };

    let items = super_update::preview(&nodes, &panel.options);
    let changed_count = items.iter().filter(|i| i.has_changes()).count();
    Some(SuperUpdateView {
        options: panel.options.clone(),
        items,
        changed_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::SuperUpdatePanel;
    use crate::core::TreeSnapshot;
    use crate::utils::test_helpers::{dir, matched_file, scanned_file, unscanned_file};
    use std::collections::HashMap;

    fn state() -> ExplorerState {
        let mut state = ExplorerState::default();
        state.snapshot = TreeSnapshot::new(
            dir(
                "/lib",
                vec![
                    dir(
                        "/lib/Show",
                        vec![
                            matched_file("/lib/Show/Show - 01.mkv", 1),
                            scanned_file("/lib/Show/Show - 02.mkv"),
                        ],
                    ),
                    unscanned_file("/lib/loose.mkv"),
                ],
            ),
            HashMap::new(),
        );
        state.expansion.expand(["/lib".to_string()]);
        state
    }

    #[test]
    fn test_rows_follow_flattened_tree() {
        let view = generate_explorer_view(&state());
        let rows: Vec<(&str, usize, bool)> = view
            .rows
            .iter()
            .map(|r| (r.name.as_str(), r.level, r.is_expanded))
            .collect();
        assert_eq!(
            rows,
            vec![("lib", 0, true), ("Show", 1, false), ("loose.mkv", 1, false)]
        );
        assert_eq!(view.rows[1].status.as_ref().map(|s| s.file_count), Some(2));
        assert!(view.rows[2].status.is_none());
        assert!(view.rows.iter().all(|r| r.checkbox.is_none()));
    }

    #[test]
    fn test_checkboxes_in_selection_mode() {
        let mut state = state();
        state.set_selecting(true);
        state.selection.replace(["/lib/Show/Show - 01.mkv".to_string()]);

        let view = generate_explorer_view(&state);
        assert_eq!(view.rows[0].checkbox, Some(CheckboxState::Indeterminate));
        assert_eq!(view.rows[1].checkbox, Some(CheckboxState::Indeterminate));
        assert_eq!(view.rows[2].checkbox, Some(CheckboxState::Unchecked));
        assert_eq!(view.selected_count, 1);
        assert!(view.selection_actions.can_unmatch);
    }

    #[test]
    fn test_summary_counts() {
        let view = generate_explorer_view(&state());
        assert!(view.summary.has_unscanned_files);
        assert_eq!(view.summary.unmatched_count, 1);
        assert_eq!(view.summary.unknown_media_count, 1);
    }

    #[test]
    fn test_super_update_preview_keeps_panel_order() {
        let mut state = state();
        state.super_update = Some(SuperUpdatePanel {
            file_paths: vec![
                "/lib/loose.mkv".to_string(),
                "/lib/missing.mkv".to_string(),
                "/lib/Show/Show - 01.mkv".to_string(),
            ],
            options: SuperUpdateOptions {
                search_text: "^".to_string(),
                replace_text: "${padding=2;start=1} ".to_string(),
                ..Default::default()
            },
        });

        let panel = generate_explorer_view(&state).super_update.expect("panel open");
        let names: Vec<&str> = panel.items.iter().map(|i| i.new_name.as_str()).collect();
        assert_eq!(names, vec!["01 loose.mkv", "02 Show - 01.mkv"]);
        assert_eq!(panel.changed_count, 2);
    }

    #[test]
    fn test_view_without_snapshot() {
        let view = generate_explorer_view(&ExplorerState::default());
        assert!(view.rows.is_empty());
        assert!(view.super_update.is_none());
    }
}
