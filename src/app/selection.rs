//! The set of selected file paths and the tri-state view derived from it.
//!
//! Only file paths are stored. A directory's checkbox is computed from the
//! files of its full subtree, regardless of expansion, search or filter.

use serde::Serialize;
use std::collections::HashSet;

use crate::core::tree::collect_file_paths;
use crate::core::TreeNode;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckboxState {
    Checked,
    Unchecked,
    Indeterminate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: HashSet<String>,
}

impl SelectionModel {
    pub fn paths(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Replaces the whole selection.
    pub fn replace(&mut self, paths: impl IntoIterator<Item = String>) {
        self.selected = paths.into_iter().collect();
    }

    /// Derives the checkbox value of a file or directory.
    pub fn checkbox_state(&self, node: &TreeNode) -> CheckboxState {
        let files = collect_file_paths(node);
        if files.is_empty() {
            return CheckboxState::Unchecked;
        }

        let selected = files.iter().filter(|p| self.selected.contains(*p)).count();
        if selected == files.len() {
            CheckboxState::Checked
        } else if selected == 0 {
            CheckboxState::Unchecked
        } else {
            CheckboxState::Indeterminate
        }
    }

    /// Selects or deselects a file, or every file under a directory.
    pub fn toggle(&mut self, node: &TreeNode, checked: bool) {
        let files = collect_file_paths(node);
        if checked {
            self.selected.extend(files);
        } else {
            for path in &files {
                self.selected.remove(path);
            }
        }
    }

    /// The selected file nodes present in `root`, in pre-order. Stale paths are skipped.
    pub fn selected_file_nodes<'a>(&self, root: &'a TreeNode) -> Vec<&'a TreeNode> {
        crate::core::tree::collect_file_nodes(root)
            .into_iter()
            .filter(|node| self.selected.contains(&node.path))
            .collect()
    }
}

/// Which bulk actions apply to the current selection.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionActions {
    /// At least one selected file is matched; otherwise the bulk action is "match".
    pub can_unmatch: bool,
    pub can_ignore: bool,
    /// Every selected file is scanned and ignored.
    pub can_unignore: bool,
}

impl SelectionActions {
    pub fn compute(nodes: &[&TreeNode]) -> Self {
        let scanned = || nodes.iter().filter_map(|n| n.local_file.as_ref());
        Self {
            can_unmatch: scanned().any(|lf| lf.is_matched()),
            can_ignore: scanned().any(|lf| !lf.ignored),
            can_unignore: !nodes.is_empty()
                && nodes
                    .iter()
                    .all(|n| n.local_file.as_ref().is_some_and(|lf| lf.ignored)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{dir, ignored_file, matched_file, scanned_file, unscanned_file};
    use proptest::prelude::*;

    fn sample_tree() -> TreeNode {
        dir(
            "/lib",
            vec![
                dir(
                    "/lib/A",
                    vec![unscanned_file("/lib/A/1.mkv"), unscanned_file("/lib/A/2.mkv")],
                ),
                dir("/lib/Empty", vec![]),
                unscanned_file("/lib/3.mkv"),
            ],
        )
    }

    #[test]
    fn test_directory_checkbox_states() {
        let tree = sample_tree();
        let mut selection = SelectionModel::default();
        assert_eq!(selection.checkbox_state(&tree), CheckboxState::Unchecked);

        selection.toggle(&tree.children[0].children[0], true);
        assert_eq!(selection.checkbox_state(&tree.children[0]), CheckboxState::Indeterminate);
        assert_eq!(selection.checkbox_state(&tree), CheckboxState::Indeterminate);

        selection.toggle(&tree.children[0], true);
        assert_eq!(selection.checkbox_state(&tree.children[0]), CheckboxState::Checked);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_empty_directory_is_unchecked() {
        let tree = sample_tree();
        let mut selection = SelectionModel::default();
        selection.toggle(&tree, true);
        assert_eq!(selection.checkbox_state(&tree.children[1]), CheckboxState::Unchecked);
        assert_eq!(selection.checkbox_state(&tree), CheckboxState::Checked);
    }

    #[test]
    fn test_only_file_paths_are_stored() {
        let tree = sample_tree();
        let mut selection = SelectionModel::default();
        selection.toggle(&tree, true);
        assert!(!selection.contains("/lib/A"));
        assert!(selection.contains("/lib/A/1.mkv"));
        assert!(selection.contains("/lib/3.mkv"));

        selection.toggle(&tree.children[0], false);
        assert_eq!(selection.paths().len(), 1);
    }

    #[test]
    fn test_selected_file_nodes_skip_stale_paths() {
        let tree = sample_tree();
        let mut selection = SelectionModel::default();
        selection.replace(["/lib/3.mkv".to_string(), "/lib/gone.mkv".to_string(), "/lib/A/1.mkv".to_string()]);
        let paths: Vec<&str> = selection
            .selected_file_nodes(&tree)
            .iter()
            .map(|n| n.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/lib/A/1.mkv", "/lib/3.mkv"]);
    }

    #[test]
    fn test_selection_actions() {
        let matched = matched_file("/lib/m.mkv", 3);
        let scanned = scanned_file("/lib/s.mkv");
        let ignored = ignored_file("/lib/i.mkv");
        let unscanned = unscanned_file("/lib/u.mkv");

        let actions = SelectionActions::compute(&[&matched, &scanned]);
        assert!(actions.can_unmatch);
        assert!(actions.can_ignore);
        assert!(!actions.can_unignore);

        let actions = SelectionActions::compute(&[&ignored]);
        assert!(!actions.can_unmatch);
        assert!(!actions.can_ignore);
        assert!(actions.can_unignore);

        let actions = SelectionActions::compute(&[&ignored, &unscanned]);
        assert!(!actions.can_unignore);

        assert_eq!(SelectionActions::compute(&[]), SelectionActions::default());
    }

    fn arb_tree() -> impl Strategy<Value = TreeNode> {
        // Two levels of directories with up to four files each.
        prop::collection::vec(0usize..4, 1..4).prop_map(|sizes| {
            let dirs = sizes
                .iter()
                .enumerate()
                .map(|(d, count)| {
                    let files = (0..*count)
                        .map(|f| unscanned_file(&format!("/r/d{d}/f{f}.mkv")))
                        .collect();
                    dir(&format!("/r/d{d}"), files)
                })
                .collect();
            dir("/r", dirs)
        })
    }

    proptest! {
        #[test]
        fn prop_tri_state_matches_subset_relation(tree in arb_tree(), picks in prop::collection::vec(any::<bool>(), 16)) {
            let files = collect_file_paths(&tree);
            let mut selection = SelectionModel::default();
            selection.replace(
                files.iter().zip(picks.iter()).filter(|(_, pick)| **pick).map(|(p, _)| p.clone()),
            );

            for child in &tree.children {
                let sub = collect_file_paths(child);
                let picked = sub.iter().filter(|p| selection.contains(p)).count();
                let expected = if sub.is_empty() || picked == 0 {
                    CheckboxState::Unchecked
                } else if picked == sub.len() {
                    CheckboxState::Checked
                } else {
                    CheckboxState::Indeterminate
                };
                prop_assert_eq!(selection.checkbox_state(child), expected);
            }

            selection.toggle(&tree, true);
            if !files.is_empty() {
                prop_assert_eq!(selection.checkbox_state(&tree), CheckboxState::Checked);
            }
            let before = selection.clone();
            selection.toggle(&tree, true);
            prop_assert_eq!(selection, before);
        }
    }
}
