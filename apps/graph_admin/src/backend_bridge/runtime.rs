//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientError, ClientEvent, GraphResource, UserDirectory};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::{Graph, GraphId};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::dialog::SaveTicket;
use crate::controller::events::{DialogEvent, UiError, UiErrorContext, UiEvent};

pub struct BackendServices {
    pub graphs: Arc<dyn GraphResource>,
    pub users: Arc<dyn UserDirectory>,
    pub client_events: Option<broadcast::Receiver<ClientEvent>>,
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    services: BackendServices,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(cmd_rx, ui_tx, services));
    })
}

async fn run(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, services: BackendServices) {
    let BackendServices {
        graphs,
        users,
        client_events,
    } = services;

    if let Some(events) = client_events {
        tokio::spawn(forward_client_events(events, ui_tx.clone()));
    }
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

    while let Ok(cmd) = cmd_rx.recv() {
        let graphs = Arc::clone(&graphs);
        let users = Arc::clone(&users);
        let ui_tx = ui_tx.clone();
        tokio::spawn(async move {
            execute(cmd, graphs.as_ref(), users.as_ref(), &ui_tx).await;
        });
    }
    tracing::debug!("ui command queue closed; backend worker stopping");
}

async fn execute(
    cmd: BackendCommand,
    graphs: &dyn GraphResource,
    users: &dyn UserDirectory,
    ui_tx: &Sender<UiEvent>,
) {
    match cmd {
        BackendCommand::ResolveGraph { id } => {
            let event = match graphs.get(id).await {
                Ok(graph) => UiEvent::GraphResolved(graph),
                Err(err) => {
                    tracing::warn!(
                        graph_id = id.0,
                        status = ?err.status(),
                        "failed to load graph: {err}"
                    );
                    resolve_failure_event(id, &err)
                }
            };
            let _ = ui_tx.try_send(event);
        }
        BackendCommand::ListUsers { dialog } => match users.list().await {
            Ok(users) => {
                let _ = ui_tx.try_send(UiEvent::Dialog(DialogEvent::UsersLoaded { dialog, users }));
            }
            Err(err) => {
                tracing::warn!(dialog = dialog.0, "user list unavailable: {err}");
            }
        },
        BackendCommand::CreateGraph { ticket, graph } => {
            let result = graphs.create(&graph).await;
            deliver_save_outcome(ui_tx, ticket, result);
        }
        BackendCommand::UpdateGraph { ticket, graph } => {
            let result = graphs.update(&graph).await;
            deliver_save_outcome(ui_tx, ticket, result);
        }
    }
}

/// The REST client already raised a banner for every error response, so those
/// only update the status line.
fn resolve_failure_event(id: GraphId, err: &ClientError) -> UiEvent {
    match err {
        ClientError::Api(_) => UiEvent::Info(format!("Graph {id} could not be loaded")),
        _ => UiEvent::Error(UiError::from_client_error(UiErrorContext::ResolveGraph, err)),
    }
}

fn deliver_save_outcome(
    ui_tx: &Sender<UiEvent>,
    ticket: SaveTicket,
    result: client_core::Result<Graph>,
) {
    let outcome =
        result.map_err(|err| UiError::from_client_error(UiErrorContext::SaveGraph, &err));
    let event = UiEvent::Dialog(DialogEvent::SaveSettled { ticket, outcome });
    // A dropped outcome would leave the dialog saving forever, so wait for room.
    if tokio::task::block_in_place(|| ui_tx.send(event)).is_err() {
        tracing::debug!(seq = ticket.seq, "ui went away before the save outcome arrived");
    }
}

async fn forward_client_events(
    mut events: broadcast::Receiver<ClientEvent>,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(ClientEvent::Alert(alert)) => UiEvent::Alert(alert),
            Ok(ClientEvent::Error { status, error }) => UiEvent::Error(UiError::from_api_error(
                UiErrorContext::General,
                status,
                &error,
            )),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "client event forwarder lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if ui_tx.try_send(event).is_err() {
            tracing::debug!("ui event queue unavailable; dropping client event");
        }
    }
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
