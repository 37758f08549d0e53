use super::*;
use crossbeam_channel::bounded;
use shared::protocol::{Alert, AlertLevel};

use crate::controller::dialog::DialogMode;
use crate::controller::events::{DialogEvent, UiErrorContext};

struct Shell {
    app: GraphAdminApp,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
}

impl Shell {
    fn start(startup: StartupAction) -> Self {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(16);
        Self {
            app: GraphAdminApp::new(cmd_tx, ui_rx, startup),
            cmd_rx,
            ui_tx,
        }
    }

    fn deliver(&mut self, event: UiEvent) {
        self.ui_tx.send(event).expect("ui queue");
        self.app.process_ui_events();
        self.app.process_notifications();
        self.app.process_modal_outcome();
    }

    fn dialog(&mut self) -> &mut GraphDialog {
        &mut self.app.dialog.as_mut().expect("dialog open").dialog
    }
}

fn saved(id: i64, name: &str) -> Graph {
    Graph {
        id: Some(GraphId(id)),
        name: Some(name.to_string()),
        ..Graph::default()
    }
}

#[test]
fn upsert_replaces_by_id_and_appends_new_graphs() {
    let mut graphs = vec![saved(1, "a"), saved(2, "b")];

    upsert_graph(&mut graphs, saved(2, "b2"));
    upsert_graph(&mut graphs, saved(3, "c"));

    let names = graphs
        .iter()
        .map(|graph| graph.name.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(names, ["a", "b2", "c"]);
}

#[test]
fn upsert_never_merges_unsaved_graphs() {
    let mut graphs = vec![Graph::new_unsaved()];

    upsert_graph(&mut graphs, Graph::new_unsaved());

    assert_eq!(graphs.len(), 2);
}

#[test]
fn create_startup_saves_and_lists_the_new_graph() {
    let mut shell = Shell::start(StartupAction::Create);
    assert_eq!(
        shell.cmd_rx.try_recv().expect("user list request"),
        BackendCommand::ListUsers {
            dialog: DialogId(1)
        }
    );
    assert_eq!(shell.dialog().mode(), DialogMode::Create);

    shell.dialog().graph_mut().name = Some("Revenue".into());
    let ticket = shell.dialog().save().expect("save dispatched");
    assert!(matches!(
        shell.cmd_rx.try_recv().expect("create command"),
        BackendCommand::CreateGraph { .. }
    ));

    shell.deliver(UiEvent::Dialog(DialogEvent::SaveSettled {
        ticket,
        outcome: Ok(saved(7, "Revenue")),
    }));

    assert!(shell.app.dialog.is_none());
    assert_eq!(shell.app.status, "Saved graph 7");
    assert_eq!(shell.app.saved_graphs, vec![saved(7, "Revenue")]);
}

#[test]
fn edit_startup_opens_dialog_once_graph_resolves() {
    let mut shell = Shell::start(StartupAction::Edit(GraphId(7)));
    assert_eq!(
        shell.cmd_rx.try_recv().expect("resolve request"),
        BackendCommand::ResolveGraph { id: GraphId(7) }
    );
    assert!(shell.app.dialog.is_none());

    shell.deliver(UiEvent::GraphResolved(saved(7, "Revenue")));

    assert_eq!(shell.dialog().mode(), DialogMode::Edit(GraphId(7)));
    assert_eq!(
        shell.cmd_rx.try_recv().expect("user list request"),
        BackendCommand::ListUsers {
            dialog: DialogId(1)
        }
    );
}

#[test]
fn cancel_reports_dismissal_without_listing_anything() {
    let mut shell = Shell::start(StartupAction::Create);

    assert!(shell.dialog().clear());
    shell.app.process_modal_outcome();

    assert!(shell.app.dialog.is_none());
    assert_eq!(shell.app.status, "Dialog dismissed (cancel)");
    assert!(shell.app.saved_graphs.is_empty());
}

#[test]
fn outcome_for_a_previous_dialog_is_ignored_by_the_next_one() {
    let mut shell = Shell::start(StartupAction::Create);
    let first_ticket = shell.dialog().save().expect("save dispatched");
    shell.dialog().clear();
    shell.app.process_modal_outcome();

    shell.app.open_dialog(Graph::new_unsaved());
    assert_eq!(shell.dialog().id(), DialogId(2));

    shell.deliver(UiEvent::Dialog(DialogEvent::SaveSettled {
        ticket: first_ticket,
        outcome: Ok(saved(9, "late")),
    }));

    assert!(shell.dialog().is_open());
    assert!(shell.app.saved_graphs.is_empty());
}

#[test]
fn graph_resolved_into_an_occupied_slot_is_reported_as_discarded() {
    let mut shell = Shell::start(StartupAction::Create);

    shell.deliver(UiEvent::GraphResolved(saved(7, "Revenue")));

    assert_eq!(shell.dialog().mode(), DialogMode::Create);
    assert_eq!(shell.app.status, "Discarded graph 7: another dialog is open");
}

#[test]
fn escape_only_dismisses_when_no_popup_is_open() {
    assert!(escape_dismisses(true, false));
    assert!(!escape_dismisses(true, true));
    assert!(!escape_dismisses(false, false));
}

#[test]
fn authorization_failures_ask_for_a_new_token() {
    let mut shell = Shell::start(StartupAction::None);

    shell.deliver(UiEvent::Error(UiError::from_message(
        UiErrorContext::General,
        "401 unauthorized",
    )));

    assert_eq!(shell.app.status, "Not authorized; restart with a valid --token");
    assert!(shell.app.banners[0].is_error);
}

#[test]
fn alerts_and_errors_become_capped_banners() {
    let mut shell = Shell::start(StartupAction::None);

    shell.deliver(UiEvent::Alert(Alert {
        level: AlertLevel::Success,
        message: "visualizer2App.graph.created".into(),
        param: Some("7".into()),
    }));
    assert_eq!(
        shell.app.banners[0],
        Banner {
            text: "graph created (7)".into(),
            is_error: false
        }
    );

    for _ in 0..MAX_BANNERS {
        shell.deliver(UiEvent::Error(UiError::from_message(
            UiErrorContext::General,
            "connection refused",
        )));
    }
    assert_eq!(shell.app.banners.len(), MAX_BANNERS);
    assert!(shell.app.banners.iter().all(|banner| banner.is_error));
}

#[test]
fn info_events_update_status_line() {
    let mut shell = Shell::start(StartupAction::None);

    shell.deliver(UiEvent::Info("Backend worker ready".into()));

    assert_eq!(shell.app.status, "Backend worker ready");
    assert!(shell.cmd_rx.try_recv().is_err());
}
