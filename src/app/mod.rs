//! The explorer's host-facing layer: state, commands and the IPC entry point.

pub mod commands;
pub mod events;
pub mod expansion;
pub mod helpers;
pub mod proxy;
pub mod selection;
pub mod service;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::IpcMessage;
use proxy::EventProxy;
use service::LibraryService;
use state::ExplorerState;

/// Parses a raw IPC message from the host and routes it to its command handler.
///
/// Unknown commands and malformed messages are logged and dropped.
pub fn handle_ipc_message<P: EventProxy, S: LibraryService + ?Sized>(
    message: String,
    service: Arc<S>,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    let msg: IpcMessage = match serde_json::from_str(&message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {} ({})", e, message);
            return;
        }
    };
    tracing::debug!(command = %msg.command, "Received IPC command");

    let payload = msg.payload;
    match msg.command.as_str() {
        "initialize" => commands::initialize(proxy, state),
        "loadSnapshot" => commands::load_snapshot(payload, proxy, state),
        "setKnownMedia" => commands::set_known_media(payload, proxy, state),
        "updateSearch" => commands::update_search(payload, proxy, state),
        "setFilter" => commands::set_filter(payload, proxy, state),
        "toggleExpansion" => commands::toggle_expansion(payload, proxy, state),
        "selectNode" => commands::select_node(payload, proxy, state),
        "revealPath" => commands::reveal_path(payload, proxy, state),
        "setSelecting" => commands::set_selecting(payload, proxy, state),
        "toggleSelection" => commands::toggle_selection(payload, proxy, state),
        "openSuperUpdate" => commands::open_super_update(proxy, state),
        "openSuperUpdateFor" => commands::open_super_update_for(payload, proxy, state),
        "updateSuperUpdateOptions" => {
            commands::update_super_update_options(payload, proxy, state)
        }
        "closeSuperUpdate" => commands::close_super_update(proxy, state),
        "applySuperUpdate" => commands::apply_super_update(service.as_ref(), proxy, state),
        "updateNode" => commands::update_node(payload, service.as_ref(), proxy, state),
        "toggleLock" => commands::toggle_lock(payload, service.as_ref(), proxy, state),
        "deleteNode" => commands::delete_node(payload, service.as_ref(), proxy, state),
        "requestMatch" => commands::request_match(payload, proxy, state),
        "unmatchSelected" => commands::unmatch_selected(service.as_ref(), proxy, state),
        "toggleIgnoreSelected" => {
            commands::toggle_ignore_selected(service.as_ref(), proxy, state)
        }
        "deleteSelected" => commands::delete_selected(service.as_ref(), proxy, state),
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}
