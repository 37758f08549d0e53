//! Edit dialog controller for a single graph.
//!
//! The dialog is owned by the UI thread. Persistence is requested through the
//! backend command queue and its outcome comes back as a [`DialogEvent`] that
//! the owner feeds into [`GraphDialog::apply`]. Once the dialog is closed or
//! dismissed it ignores every later event, including outcomes of saves that
//! were dispatched before it closed.

use crossbeam_channel::{bounded, Receiver, Sender};
use shared::{
    domain::{Graph, GraphId, UserSummary},
    protocol::GraphNotification,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{DialogEvent, UiError};
use crate::controller::orchestration::dispatch_backend_command;

/// Form field focused once the dialog is first rendered. Field 0 is the read-only id.
pub const INITIAL_FOCUS_FIELD: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(pub u64);

/// Identifies one save attempt of one dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveTicket {
    pub dialog: DialogId,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Cancel,
    EscapeKey,
}

impl DismissReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DismissReason::Cancel => "cancel",
            DismissReason::EscapeKey => "escape key press",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    Closed(Graph),
    Dismissed(DismissReason),
}

pub trait ModalHost {
    /// Ends the dialog and hands `result` to whoever opened it.
    fn close(&mut self, result: Graph);
    fn dismiss(&mut self, reason: DismissReason);
}

/// Channel-backed modal host. The opener keeps the receiving end and sees at
/// most one [`ModalOutcome`].
pub struct ModalHandle {
    outcome_tx: Sender<ModalOutcome>,
    settled: bool,
}

impl ModalHandle {
    pub fn channel() -> (Self, Receiver<ModalOutcome>) {
        let (outcome_tx, outcome_rx) = bounded(1);
        (
            Self {
                outcome_tx,
                settled: false,
            },
            outcome_rx,
        )
    }

    fn settle(&mut self, outcome: ModalOutcome) {
        if self.settled {
            warn!(?outcome, "modal already settled; ignoring outcome");
            return;
        }
        self.settled = true;
        if self.outcome_tx.try_send(outcome).is_err() {
            debug!("modal opener went away before the dialog settled");
        }
    }
}

impl ModalHost for ModalHandle {
    fn close(&mut self, result: Graph) {
        self.settle(ModalOutcome::Closed(result));
    }

    fn dismiss(&mut self, reason: DismissReason) {
        self.settle(ModalOutcome::Dismissed(reason));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Idle,
    Saving(SaveTicket),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit(GraphId),
}

impl DialogMode {
    pub fn title(self) -> String {
        match self {
            DialogMode::Create => "Create a new Graph".to_string(),
            DialogMode::Edit(id) => format!("Edit Graph {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveRejected {
    #[error("a save is already in flight (attempt {})", .0.seq)]
    InFlight(SaveTicket),
    #[error("the dialog is closed")]
    Closed,
    #[error("save could not be queued: {}", .0.message())]
    Dispatch(UiError),
}

pub struct GraphDialog<M: ModalHost = ModalHandle> {
    id: DialogId,
    graph: Graph,
    users: Vec<UserSummary>,
    state: DialogState,
    next_seq: u64,
    cmd_tx: Sender<BackendCommand>,
    notifications: Sender<GraphNotification>,
    modal: M,
    focus_request: Option<usize>,
    last_error: Option<UiError>,
}

impl<M: ModalHost> GraphDialog<M> {
    /// Opens the dialog on `entity`, which is either fresh (no id) or resolved
    /// from the backend, and requests the user list for the owner selector.
    pub fn open(
        id: DialogId,
        entity: Graph,
        modal: M,
        cmd_tx: Sender<BackendCommand>,
        notifications: Sender<GraphNotification>,
    ) -> Self {
        let dialog = Self {
            id,
            graph: entity,
            users: Vec::new(),
            state: DialogState::Idle,
            next_seq: 0,
            cmd_tx,
            notifications,
            modal,
            focus_request: Some(INITIAL_FOCUS_FIELD),
            last_error: None,
        };
        debug!(dialog = id.0, mode = ?dialog.mode(), "graph dialog opened");

        if let Err(err) = dispatch_backend_command(
            &dialog.cmd_tx,
            BackendCommand::ListUsers { dialog: id },
        ) {
            warn!(
                dialog = id.0,
                error = %err.message(),
                "could not request user list; selection stays empty"
            );
        }
        dialog
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Form bindings edit the record in place.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn mode(&self) -> DialogMode {
        match self.graph.id {
            Some(id) => DialogMode::Edit(id),
            None => DialogMode::Create,
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.state, DialogState::Saving(_))
    }

    pub fn is_open(&self) -> bool {
        self.state != DialogState::Closed
    }

    pub fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    /// One-shot: returns the field to focus on the first call only.
    pub fn take_focus_request(&mut self) -> Option<usize> {
        self.focus_request.take()
    }

    /// Persists the record: update when it has an id, create otherwise.
    pub fn save(&mut self) -> Result<SaveTicket, SaveRejected> {
        match self.state {
            DialogState::Closed => return Err(SaveRejected::Closed),
            DialogState::Saving(ticket) => {
                debug!(dialog = self.id.0, seq = ticket.seq, "save already in flight");
                return Err(SaveRejected::InFlight(ticket));
            }
            DialogState::Idle => {}
        }

        self.next_seq += 1;
        let ticket = SaveTicket {
            dialog: self.id,
            seq: self.next_seq,
        };
        self.state = DialogState::Saving(ticket);
        self.last_error = None;

        let graph = self.graph.clone();
        let command = if graph.is_persisted() {
            BackendCommand::UpdateGraph { ticket, graph }
        } else {
            BackendCommand::CreateGraph { ticket, graph }
        };

        if let Err(err) = dispatch_backend_command(&self.cmd_tx, command) {
            self.state = DialogState::Idle;
            self.last_error = Some(err.clone());
            return Err(SaveRejected::Dispatch(err));
        }
        Ok(ticket)
    }

    /// Cancels the dialog without touching persistence.
    pub fn clear(&mut self) -> bool {
        self.dismiss_with(DismissReason::Cancel)
    }

    pub fn dismiss_with(&mut self, reason: DismissReason) -> bool {
        match self.state {
            DialogState::Closed => return false,
            DialogState::Saving(ticket) => debug!(
                dialog = self.id.0,
                seq = ticket.seq,
                "dismissed with a save in flight; its outcome will be ignored"
            ),
            DialogState::Idle => {}
        }
        self.modal.dismiss(reason);
        self.state = DialogState::Closed;
        true
    }

    pub fn apply(&mut self, event: DialogEvent) {
        if event.dialog() != self.id {
            return;
        }
        if self.state == DialogState::Closed {
            debug!(dialog = self.id.0, "ignoring event for closed dialog");
            return;
        }

        match event {
            DialogEvent::UsersLoaded { users, .. } => self.users = users,
            DialogEvent::SaveSettled { ticket, outcome } => {
                if self.state != DialogState::Saving(ticket) {
                    debug!(dialog = self.id.0, seq = ticket.seq, "ignoring stale save outcome");
                    return;
                }
                match outcome {
                    Ok(saved) => self.on_save_success(saved),
                    Err(err) => self.on_save_error(err),
                }
            }
        }
    }

    fn on_save_success(&mut self, saved: Graph) {
        info!(dialog = self.id.0, graph_id = ?saved.id, "graph saved");
        let notification = GraphNotification::GraphUpdated {
            graph: saved.clone(),
        };
        if self.notifications.try_send(notification).is_err() {
            warn!(dialog = self.id.0, "graph update notification was not delivered");
        }
        self.modal.close(saved);
        self.state = DialogState::Closed;
    }

    fn on_save_error(&mut self, err: UiError) {
        warn!(
            dialog = self.id.0,
            context = ?err.context(),
            error = %err.message(),
            "graph save failed"
        );
        self.state = DialogState::Idle;
        self.last_error = Some(err);
    }
}

#[cfg(test)]
#[path = "../tests/dialog_tests.rs"]
mod tests;
