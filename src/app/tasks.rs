//! Background work scheduled on the tokio runtime.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::ExplorerState;
use super::view_model::generate_explorer_view;

/// (Re)schedules the cascade-collapse sweep after an expansion change.
///
/// Any pending sweep is aborted first, so at most one is in flight. Must be
/// called with the state already locked; `state` is the handle the task will
/// lock once the delay elapses.
pub fn schedule_collapse_sweep<P: EventProxy>(
    guard: &mut ExplorerState,
    proxy: P,
    state: Arc<Mutex<ExplorerState>>,
) {
    guard.cancel_collapse_sweep();
    guard.collapse_generation = guard.collapse_generation.wrapping_add(1);
    let generation = guard.collapse_generation;
    let delay = Duration::from_millis(guard.config.collapse_debounce_ms);

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let task = handle.spawn(async move {
                tokio::time::sleep(delay).await;
                run_collapse_sweep(proxy, state, generation);
            });
            guard.collapse_task = Some(task);
        }
        Err(_) => {
            // Without a runtime there is nothing to debounce on.
            tracing::debug!("No tokio runtime, settling expansion immediately");
            guard.expansion.settle();
        }
    }
}

fn run_collapse_sweep<P: EventProxy>(proxy: P, state: Arc<Mutex<ExplorerState>>, generation: u64) {
    let mut state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");

    if state_guard.collapse_generation != generation {
        tracing::debug!("Collapse sweep superseded, skipping");
        return;
    }
    state_guard.collapse_task = None;

    let removed = state_guard.expansion.settle();
    if removed.is_empty() {
        return;
    }

    tracing::debug!(count = removed.len(), "Collapsed descendants of closed directories");
    let view = generate_explorer_view(&state_guard);
    proxy.send_event(UserEvent::StateUpdate(Box::new(view)));
}
