//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = match &cmd {
        BackendCommand::ResolveGraph { .. } => "resolve_graph",
        BackendCommand::ListUsers { .. } => "list_users",
        BackendCommand::CreateGraph { .. } => "create_graph",
        BackendCommand::UpdateGraph { .. } => "update_graph",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(UiError::from_message(
            UiErrorContext::General,
            "UI command queue is full; please retry",
        )),
        Err(TrySendError::Disconnected(_)) => Err(UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure); restart the app",
        )),
    }
}
