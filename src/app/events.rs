//! Defines the event and message structures exchanged with the host UI.

use serde::Deserialize;

use super::view_model::ExplorerView;
use crate::core::LocalFile;

/// Events sent from the explorer to the host UI.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete render model to re-draw the explorer.
    StateUpdate(Box<ExplorerView>),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// A warning that did not stop the operation.
    ShowWarning(String),
    /// Confirmation of a completed operation.
    ShowSuccess(String),
    /// Asks the list to scroll the row at this index into view.
    ScrollToIndex(usize),
    /// Scanned, unmatched files under a node, for the external matching dialog.
    ShowMatchCandidates { path: String, files: Vec<LocalFile> },
}

/// A message received from the host via its IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
