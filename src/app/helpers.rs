//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::sync::{Arc, Mutex};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::ExplorerState;
use super::view_model::generate_explorer_view;

/// Locks the `ExplorerState`, performs a mutation, and then sends a
/// `StateUpdate` event with the freshly generated view.
pub fn with_state_and_notify<F, P: EventProxy>(
    state: &Arc<Mutex<ExplorerState>>,
    proxy: &P,
    update_fn: F,
) where
    F: FnOnce(&mut ExplorerState),
{
    let mut state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");

    update_fn(&mut state_guard);

    notify(&state_guard, proxy);
}

/// Sends the current view without mutating anything.
pub fn notify<P: EventProxy>(state: &ExplorerState, proxy: &P) {
    let view = generate_explorer_view(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(view)));
}
