//! Contains all the command handlers that are callable from the host via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers mutate the `ExplorerState`, call the `LibraryService` where a
//! change must be persisted, and send `UserEvent`s back to the UI.

use serde::Deserialize;
use std::sync::{Arc, Mutex};

use super::events::UserEvent;
use super::helpers::{notify, with_state_and_notify};
use super::proxy::EventProxy;
use super::service::{LibraryService, LocalFileAction};
use super::state::{ExplorerState, SuperUpdatePanel};
use super::tasks::schedule_collapse_sweep;
use crate::core::super_update::{self, SuperUpdateOptions};
use crate::core::tree::{
    collect_file_paths, file_nodes_by_path, find_node, find_node_and_parents, match_candidates,
    NodeStatus,
};
use crate::core::{CoreError, Filter, TreeNode, TreeSnapshot};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SelectionPayload {
    path: String,
    checked: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NodeActionPayload {
    path: String,
    action: LocalFileAction,
}

fn lock(state: &Arc<Mutex<ExplorerState>>) -> std::sync::MutexGuard<'_, ExplorerState> {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
}

/// Paths a node-level action applies to: the file itself, or every file below a directory.
fn target_paths(node: &TreeNode) -> Vec<String> {
    if node.is_file() {
        vec![node.path.clone()]
    } else {
        collect_file_paths(node)
    }
}

/// Handles the initial request for state from the host when it loads.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<ExplorerState>>) {
    let state_guard = lock(&state);
    notify(&state_guard, &proxy);
}

/// Replaces the tree snapshot with a fresh one from the library service.
///
/// Selection and expansion are kept; paths that no longer exist are ignored
/// by everything derived from them.
pub fn load_snapshot<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    match serde_json::from_value::<TreeSnapshot>(payload) {
        Ok(snapshot) => {
            with_state_and_notify(&state, &proxy, |s| {
                tracing::info!(
                    local_files = snapshot.local_files.len(),
                    "Loaded library snapshot"
                );
                s.snapshot = snapshot;
            });
        }
        Err(e) => {
            let error = CoreError::from(e);
            tracing::warn!("Failed to deserialize snapshot: {}", error);
            proxy.send_event(UserEvent::ShowError(error.to_string()));
        }
    }
}

/// Replaces the set of media ids the user owns.
pub fn set_known_media<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(ids) = serde_json::from_value::<Vec<i64>>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.known_media = ids.into_iter().collect();
        });
    } else {
        tracing::warn!("Failed to deserialize media ids from payload: {:?}", payload);
    }
}

/// Updates the name search.
pub fn update_search<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(term) = serde_json::from_value::<String>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.search_term = term;
        });
    } else {
        tracing::warn!("Failed to deserialize search term from payload: {:?}", payload);
    }
}

/// Sets or clears (`null`) the category filter.
pub fn set_filter<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(filter) = serde_json::from_value::<Option<Filter>>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.filter = filter;
        });
    } else {
        tracing::warn!("Failed to deserialize filter from payload: {:?}", payload);
    }
}

/// Toggles the expanded/collapsed state of a directory and schedules the collapse sweep.
pub fn toggle_expansion<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(path) = serde_json::from_value::<String>(payload.clone()) {
        let sweep_proxy = proxy.clone();
        let sweep_state = state.clone();
        with_state_and_notify(&state, &proxy, |s| {
            s.expansion.toggle(&path);
            schedule_collapse_sweep(s, sweep_proxy, sweep_state);
        });
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Highlights a node.
pub fn select_node<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(path) = serde_json::from_value::<Option<String>>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.selected_node = path;
        });
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Finds a node by path (ignoring case), expands its ancestors, highlights it
/// and asks the UI to scroll to its row.
pub fn reveal_path<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(path) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
        return;
    };

    let sweep_proxy = proxy.clone();
    let sweep_state = state.clone();
    let mut scroll_to = None;
    with_state_and_notify(&state, &proxy, |s| {
        let Some((target, ancestors)) = s
            .root()
            .and_then(|root| find_node_and_parents(root, &path))
            .map(|(node, parents)| (node.path.clone(), parents))
        else {
            tracing::debug!("Reveal target {} not found", path);
            return;
        };

        s.expansion.expand(ancestors);
        s.expansion.expand([target.clone()]);
        s.selected_node = Some(target.clone());
        schedule_collapse_sweep(s, sweep_proxy, sweep_state);

        scroll_to = s
            .flatten()
            .iter()
            .find(|item| item.node.path == target)
            .map(|item| item.index);
    });

    if let Some(index) = scroll_to {
        proxy.send_event(UserEvent::ScrollToIndex(index));
    }
}

/// Enters or leaves selection mode. Leaving clears the selection.
pub fn set_selecting<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(selecting) = serde_json::from_value::<bool>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.set_selecting(selecting);
        });
    } else {
        tracing::warn!("Failed to deserialize boolean from payload: {:?}", payload);
    }
}

/// Checks or unchecks a file, or every file under a directory.
pub fn toggle_selection<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(SelectionPayload { path, checked }) =
        serde_json::from_value::<SelectionPayload>(payload.clone())
    {
        with_state_and_notify(&state, &proxy, |s| {
            let ExplorerState {
                snapshot,
                selection,
                ..
            } = s;
            match snapshot.root.as_ref().and_then(|root| find_node(root, &path)) {
                Some(node) => selection.toggle(node, checked),
                None => tracing::debug!("Ignoring selection of unknown path {}", path),
            }
        });
    } else {
        tracing::warn!("Failed to deserialize selection from payload: {:?}", payload);
    }
}

/// Opens the batch update panel for the current selection.
pub fn open_super_update<P: EventProxy>(proxy: P, state: Arc<Mutex<ExplorerState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        let file_paths: Vec<String> = s
            .selected_file_nodes()
            .iter()
            .map(|n| n.path.clone())
            .collect();
        s.super_update = Some(SuperUpdatePanel {
            file_paths,
            options: s.config.super_update_options(),
        });
    });
}

/// Selects the files of one node and opens the batch update panel for them.
pub fn open_super_update_for<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(path) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
        return;
    };

    with_state_and_notify(&state, &proxy, |s| {
        let Some(file_paths) = s
            .root()
            .and_then(|root| find_node(root, &path))
            .map(target_paths)
        else {
            tracing::debug!("Cannot open batch update for unknown path {}", path);
            return;
        };
        s.is_selecting = true;
        s.selection.replace(file_paths.iter().cloned());
        s.super_update = Some(SuperUpdatePanel {
            file_paths,
            options: s.config.super_update_options(),
        });
    });
}

/// Replaces the batch options; the preview is recomputed with the next view.
pub fn update_super_update_options<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    if let Ok(mut options) = serde_json::from_value::<SuperUpdateOptions>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            options.max_file_name_length = s.config.max_file_name_length;
            match s.super_update.as_mut() {
                Some(panel) => panel.options = options,
                None => tracing::debug!("Batch options received while the panel is closed"),
            }
        });
    } else {
        tracing::warn!("Failed to deserialize batch options from payload: {:?}", payload);
    }
}

pub fn close_super_update<P: EventProxy>(proxy: P, state: Arc<Mutex<ExplorerState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.super_update = None;
    });
}

/// Computes the change set of the open panel and submits it.
///
/// With nothing to apply the user gets an error message and nothing is sent.
/// On success the panel closes and a summary is shown.
pub fn apply_super_update<P: EventProxy, S: LibraryService + ?Sized>(
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let mut state_guard = lock(&state);
    let Some(panel) = state_guard.super_update.as_ref() else {
        tracing::warn!("apply_super_update called without an open panel");
        return;
    };

    let change_set = {
        let nodes: Vec<&TreeNode> = match state_guard.root() {
            Some(root) => file_nodes_by_path(root, &panel.file_paths),
            None => Vec::new(),
        };
        let items = super_update::preview(&nodes, &panel.options);
        super_update::build_change_set(&items)
    };

    let change_set = match change_set {
        Ok(change_set) => change_set,
        Err(e) => {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
    };

    if change_set.skipped > 0 {
        proxy.send_event(UserEvent::ShowWarning(format!(
            "Applying {} changes, skipping {} invalid changes",
            change_set.files.len(),
            change_set.skipped
        )));
    }

    let message = change_set.success_message();
    match service.super_update_local_files(change_set.files) {
        Ok(()) => {
            tracing::info!("{}", message);
            state_guard.super_update = None;
            proxy.send_event(UserEvent::ShowSuccess(message));
            notify(&state_guard, &proxy);
        }
        Err(e) => {
            tracing::error!("Batch update failed: {}", e);
            proxy.send_event(UserEvent::ShowError(format!("Failed to update files: {e}")));
        }
    }
}

fn run_service_call<P: EventProxy>(proxy: &P, what: &str, result: anyhow::Result<()>) {
    match result {
        Ok(()) => tracing::info!("{} succeeded", what),
        Err(e) => {
            tracing::error!("{} failed: {}", what, e);
            proxy.send_event(UserEvent::ShowError(format!("{what} failed: {e}")));
        }
    }
}

/// Applies a lock/unlock/ignore/unignore/unmatch action to a node's files.
pub fn update_node<P: EventProxy, S: LibraryService + ?Sized>(
    payload: serde_json::Value,
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(NodeActionPayload { path, action }) =
        serde_json::from_value::<NodeActionPayload>(payload.clone())
    else {
        tracing::warn!("Failed to deserialize node action from payload: {:?}", payload);
        return;
    };

    let paths = {
        let state_guard = lock(&state);
        state_guard
            .root()
            .and_then(|root| find_node(root, &path))
            .map(target_paths)
    };
    match paths {
        Some(paths) if !paths.is_empty() => {
            let what = format!("{action:?} of {} file(s)", paths.len());
            run_service_call(&proxy, &what, service.update_local_files(paths, action));
        }
        _ => tracing::debug!("No files to update under {}", path),
    }
}

/// Locks a node's files, or unlocks them when they are all locked already.
pub fn toggle_lock<P: EventProxy, S: LibraryService + ?Sized>(
    payload: serde_json::Value,
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(path) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
        return;
    };

    let request = {
        let state_guard = lock(&state);
        state_guard.root().and_then(|root| find_node(root, &path)).map(|node| {
            let action = if NodeStatus::compute(node).is_locked {
                LocalFileAction::Unlock
            } else {
                LocalFileAction::Lock
            };
            (target_paths(node), action)
        })
    };

    match request {
        Some((paths, action)) if !paths.is_empty() => {
            let what = format!("{action:?} of {} file(s)", paths.len());
            run_service_call(&proxy, &what, service.update_local_files(paths, action));
        }
        _ => tracing::debug!("No files to lock under {}", path),
    }
}

/// Deletes a node's files.
pub fn delete_node<P: EventProxy, S: LibraryService + ?Sized>(
    payload: serde_json::Value,
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(path) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
        return;
    };

    let paths = {
        let state_guard = lock(&state);
        state_guard
            .root()
            .and_then(|root| find_node(root, &path))
            .map(target_paths)
            .unwrap_or_default()
    };
    if paths.is_empty() {
        return;
    }
    let what = format!("Deletion of {} file(s)", paths.len());
    run_service_call(&proxy, &what, service.delete_local_files(paths));
}

/// Sends the unmatched files under a node to the matching dialog.
pub fn request_match<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let Ok(path) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
        return;
    };

    let files = {
        let state_guard = lock(&state);
        state_guard
            .root()
            .and_then(|root| find_node(root, &path))
            .map(match_candidates)
    };
    match files {
        Some(files) if !files.is_empty() => {
            proxy.send_event(UserEvent::ShowMatchCandidates { path, files });
        }
        Some(_) => proxy.send_event(UserEvent::ShowError(
            "There are no unmatched files to match.".to_string(),
        )),
        None => tracing::debug!("Match requested for unknown path {}", path),
    }
}

fn selected_paths(state: &ExplorerState) -> Vec<String> {
    let mut paths: Vec<String> = state.selection.paths().iter().cloned().collect();
    paths.sort();
    paths
}

/// Unmatches every selected file, or opens matching for them when none is matched.
pub fn unmatch_selected<P: EventProxy, S: LibraryService + ?Sized>(
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let (actions, paths, candidates) = {
        let state_guard = lock(&state);
        let nodes = state_guard.selected_file_nodes();
        let candidates: Vec<_> = nodes
            .iter()
            .filter_map(|n| n.local_file.as_ref())
            .filter(|lf| !lf.is_matched())
            .cloned()
            .collect();
        (
            super::selection::SelectionActions::compute(&nodes),
            selected_paths(&state_guard),
            candidates,
        )
    };

    if paths.is_empty() {
        return;
    }
    if actions.can_unmatch {
        let what = format!("Unmatch of {} file(s)", paths.len());
        run_service_call(
            &proxy,
            &what,
            service.update_local_files(paths, LocalFileAction::Unmatch),
        );
    } else if !candidates.is_empty() {
        proxy.send_event(UserEvent::ShowMatchCandidates {
            path: String::new(),
            files: candidates,
        });
    }
}

/// Ignores the selected files if any is not ignored yet, otherwise un-ignores them.
pub fn toggle_ignore_selected<P: EventProxy, S: LibraryService + ?Sized>(
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let (actions, paths) = {
        let state_guard = lock(&state);
        let nodes = state_guard.selected_file_nodes();
        (
            super::selection::SelectionActions::compute(&nodes),
            selected_paths(&state_guard),
        )
    };

    let action = if actions.can_ignore {
        LocalFileAction::Ignore
    } else if actions.can_unignore {
        LocalFileAction::Unignore
    } else {
        return;
    };
    let what = format!("{action:?} of {} file(s)", paths.len());
    run_service_call(&proxy, &what, service.update_local_files(paths, action));
}

/// Deletes every selected file.
pub fn delete_selected<P: EventProxy, S: LibraryService + ?Sized>(
    service: &S,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let paths = selected_paths(&lock(&state));
    if paths.is_empty() {
        return;
    }
    let what = format!("Deletion of {} file(s)", paths.len());
    match service.delete_local_files(paths) {
        Ok(()) => {
            tracing::info!("{} succeeded", what);
            with_state_and_notify(&state, &proxy, |s| s.selection.clear());
        }
        Err(e) => {
            tracing::error!("{} failed: {}", what, e);
            proxy.send_event(UserEvent::ShowError(format!("{what} failed: {e}")));
        }
    }
}
