//! Expanded directory paths and the cascade-collapse sweep.
//!
//! Collapsing a directory does not touch its descendants right away. A later
//! [`ExpansionModel::settle`] call (scheduled by `tasks`) compares the current
//! set to the last settled one and drops every expanded path below a
//! directory that was collapsed in between.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionModel {
    expanded: HashSet<String>,
    settled: HashSet<String>,
}

impl ExpansionModel {
    pub fn paths(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    /// Flips a directory's membership. Returns whether it is now expanded.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_string());
            true
        }
    }

    pub fn expand(&mut self, paths: impl IntoIterator<Item = String>) {
        self.expanded.extend(paths);
    }

    /// Forgets every expanded path, settled state included.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.settled.clear();
    }

    /// Removes the descendants of directories collapsed since the last call.
    ///
    /// Returns the removed paths, sorted.
    pub fn settle(&mut self) -> Vec<String> {
        let collapsed: Vec<String> = self
            .settled
            .difference(&self.expanded)
            .map(|c| format!("{c}/"))
            .collect();

        let mut removed: Vec<String> = self
            .expanded
            .iter()
            .filter(|p| collapsed.iter().any(|prefix| p.starts_with(prefix.as_str())))
            .cloned()
            .collect();
        for path in &removed {
            self.expanded.remove(path);
        }
        removed.sort();

        self.settled = self.expanded.clone();
        removed
    }
}
