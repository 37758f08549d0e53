use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{Graph, GraphId, GraphType, UserSummary},
    protocol::GraphNotification,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    dialog::{
        DialogId, DismissReason, GraphDialog, ModalHandle, ModalOutcome, INITIAL_FOCUS_FIELD,
    },
    events::{UiError, UiEvent},
    orchestration::dispatch_backend_command,
};

const MAX_BANNERS: usize = 5;
const EMPTY_CHOICE: &str = "(none)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    None,
    Create,
    Edit(GraphId),
}

struct OpenDialog {
    dialog: GraphDialog,
    outcome_rx: Receiver<ModalOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Banner {
    text: String,
    is_error: bool,
}

pub struct GraphAdminApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    notifications_tx: Sender<GraphNotification>,
    notifications_rx: Receiver<GraphNotification>,
    dialog: Option<OpenDialog>,
    next_dialog_id: u64,
    saved_graphs: Vec<Graph>,
    edit_id_input: String,
    status: String,
    banners: Vec<Banner>,
}

impl GraphAdminApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupAction,
    ) -> Self {
        let (notifications_tx, notifications_rx) = unbounded();
        let mut app = Self {
            cmd_tx,
            ui_rx,
            notifications_tx,
            notifications_rx,
            dialog: None,
            next_dialog_id: 0,
            saved_graphs: Vec::new(),
            edit_id_input: String::new(),
            status: "Starting backend worker...".to_string(),
            banners: Vec::new(),
        };

        match startup {
            StartupAction::None => {}
            StartupAction::Create => app.open_dialog(Graph::new_unsaved()),
            StartupAction::Edit(id) => app.request_edit(id),
        }
        app
    }

    fn open_dialog(&mut self, graph: Graph) {
        if self.dialog.is_some() {
            self.status = "Finish the open dialog first".to_string();
            return;
        }
        self.next_dialog_id += 1;
        let (modal, outcome_rx) = ModalHandle::channel();
        let dialog = GraphDialog::open(
            DialogId(self.next_dialog_id),
            graph,
            modal,
            self.cmd_tx.clone(),
            self.notifications_tx.clone(),
        );
        self.dialog = Some(OpenDialog { dialog, outcome_rx });
    }

    fn open_resolved(&mut self, graph: Graph) {
        if self.dialog.is_some() {
            let label = graph.id.map(|id| id.to_string()).unwrap_or_default();
            self.status = format!("Discarded graph {label}: another dialog is open");
            return;
        }
        self.open_dialog(graph);
    }

    fn request_edit(&mut self, id: GraphId) {
        match dispatch_backend_command(&self.cmd_tx, BackendCommand::ResolveGraph { id }) {
            Ok(()) => self.status = format!("Loading graph {id}..."),
            Err(err) => self.push_error(&err),
        }
    }

    fn push_banner(&mut self, text: String, is_error: bool) {
        self.banners.push(Banner { text, is_error });
        if self.banners.len() > MAX_BANNERS {
            self.banners.remove(0);
        }
    }

    fn push_error(&mut self, err: &UiError) {
        self.push_banner(err.banner_text(), true);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(text) => self.status = text,
                UiEvent::Error(err) => {
                    if err.requires_reauth() {
                        self.status = "Not authorized; restart with a valid --token".to_string();
                    }
                    self.push_error(&err);
                }
                UiEvent::Alert(alert) => self.push_banner(alert.display_text(), false),
                UiEvent::GraphResolved(graph) => self.open_resolved(graph),
                UiEvent::Dialog(event) => {
                    if let Some(open) = self.dialog.as_mut() {
                        open.dialog.apply(event);
                    }
                }
            }
        }
    }

    fn process_notifications(&mut self) {
        while let Ok(notification) = self.notifications_rx.try_recv() {
            tracing::debug!(event = notification.name(), "graph notification");
            upsert_graph(&mut self.saved_graphs, notification.graph().clone());
        }
    }

    fn process_modal_outcome(&mut self) {
        let Some(outcome) = self
            .dialog
            .as_ref()
            .and_then(|open| open.outcome_rx.try_recv().ok())
        else {
            return;
        };
        self.dialog = None;
        self.status = match outcome {
            ModalOutcome::Closed(graph) => match graph.id {
                Some(id) => format!("Saved graph {id}"),
                None => "Saved graph".to_string(),
            },
            ModalOutcome::Dismissed(reason) => format!("Dialog dismissed ({})", reason.as_str()),
        };
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("graph_admin_toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Graphs");
                ui.separator();

                let idle = self.dialog.is_none();
                if ui
                    .add_enabled(idle, egui::Button::new("Create a new Graph"))
                    .clicked()
                {
                    self.open_dialog(Graph::new_unsaved());
                }

                ui.separator();
                ui.add(
                    egui::TextEdit::singleline(&mut self.edit_id_input)
                        .hint_text("Graph id")
                        .desired_width(80.0),
                );
                let parsed_id = self.edit_id_input.trim().parse::<i64>().ok();
                if ui
                    .add_enabled(idle && parsed_id.is_some(), egui::Button::new("Edit"))
                    .clicked()
                {
                    if let Some(id) = parsed_id {
                        self.request_edit(GraphId(id));
                    }
                }
            });
            ui.small(&self.status);

            let mut dismissed = None;
            for (index, banner) in self.banners.iter().enumerate() {
                ui.horizontal(|ui| {
                    let color = if banner.is_error {
                        ui.visuals().error_fg_color
                    } else {
                        ui.visuals().hyperlink_color
                    };
                    ui.colored_label(color, &banner.text);
                    if ui.small_button("✕").clicked() {
                        dismissed = Some(index);
                    }
                });
            }
            if let Some(index) = dismissed {
                self.banners.remove(index);
            }
            ui.add_space(4.0);
        });
    }

    fn show_saved_graphs(&mut self, ctx: &egui::Context) {
        let mut edit_requested = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.saved_graphs.is_empty() {
                ui.weak("No graphs saved in this session yet.");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::Grid::new("saved_graphs")
                    .num_columns(6)
                    .striped(true)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        for header in ["ID", "Name", "Type", "Shared", "User", ""] {
                            ui.strong(header);
                        }
                        ui.end_row();

                        for graph in &self.saved_graphs {
                            ui.label(graph.id.map(|id| id.to_string()).unwrap_or_default());
                            ui.label(graph.name.as_deref().unwrap_or_default());
                            ui.label(graph.graph_type.map(GraphType::label).unwrap_or_default());
                            ui.label(if graph.shared { "yes" } else { "no" });
                            ui.label(
                                graph
                                    .user
                                    .as_ref()
                                    .map(|user| user.login.as_str())
                                    .unwrap_or_default(),
                            );
                            if ui
                                .add_enabled(
                                    self.dialog.is_none() && graph.id.is_some(),
                                    egui::Button::new("Edit"),
                                )
                                .clicked()
                            {
                                edit_requested = graph.id;
                            }
                            ui.end_row();
                        }
                    });
            });
        });

        if let Some(id) = edit_requested {
            self.request_edit(id);
        }
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(open) = self.dialog.as_mut() else {
            return;
        };
        let dialog = &mut open.dialog;
        if !dialog.is_open() {
            return;
        }

        let focus_field = dialog.take_focus_request();
        let users = dialog.users().to_vec();
        let saving = dialog.is_saving();
        let escape_pressed = escape_dismisses(
            ctx.input(|input| input.key_pressed(egui::Key::Escape)),
            egui::Popup::is_any_open(ctx),
        );
        let mut save_clicked = false;
        let mut cancel_clicked = false;

        egui::Window::new(dialog.mode().title())
            .id(egui::Id::new(("graph_dialog", dialog.id().0)))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("graph_dialog_fields")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("ID");
                        let mut id_text = dialog
                            .graph()
                            .id
                            .map(|id| id.to_string())
                            .unwrap_or_default();
                        ui.add_enabled(false, egui::TextEdit::singleline(&mut id_text));
                        ui.end_row();

                        let graph = dialog.graph_mut();

                        ui.label("Name");
                        let mut name = graph.name.clone().unwrap_or_default();
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut name).hint_text("Graph name"),
                        );
                        if focus_field == Some(INITIAL_FOCUS_FIELD) {
                            response.request_focus();
                        }
                        if response.changed() {
                            graph.name = if name.is_empty() { None } else { Some(name) };
                        }
                        ui.end_row();

                        ui.label("Type");
                        egui::ComboBox::from_id_salt("graph_type")
                            .selected_text(
                                graph.graph_type.map(GraphType::label).unwrap_or(EMPTY_CHOICE),
                            )
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut graph.graph_type, None, EMPTY_CHOICE);
                                for kind in GraphType::ALL {
                                    ui.selectable_value(
                                        &mut graph.graph_type,
                                        Some(kind),
                                        kind.label(),
                                    );
                                }
                            });
                        ui.end_row();

                        ui.label("Shared");
                        ui.checkbox(&mut graph.shared, "");
                        ui.end_row();

                        ui.label("User");
                        egui::ComboBox::from_id_salt("graph_user")
                            .selected_text(
                                graph
                                    .user
                                    .as_ref()
                                    .map(UserSummary::display_label)
                                    .unwrap_or_else(|| EMPTY_CHOICE.to_string()),
                            )
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut graph.user, None, EMPTY_CHOICE);
                                for user in &users {
                                    ui.selectable_value(
                                        &mut graph.user,
                                        Some(user.clone()),
                                        user.display_label(),
                                    );
                                }
                            });
                        ui.end_row();
                    });

                if let Some(err) = dialog.last_error() {
                    let error_color = ui.visuals().error_fg_color;
                    ui.colored_label(error_color, format!("Save failed: {}", err.message()));
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel_clicked = true;
                    }
                    let label = if saving { "Saving..." } else { "Save" };
                    if ui.add_enabled(!saving, egui::Button::new(label)).clicked() {
                        save_clicked = true;
                    }
                    if saving {
                        ui.spinner();
                    }
                });
            });

        if cancel_clicked {
            dialog.clear();
        } else if escape_pressed {
            dialog.dismiss_with(DismissReason::EscapeKey);
        } else if save_clicked {
            if let Err(rejected) = dialog.save() {
                tracing::debug!(%rejected, "save not dispatched");
            }
        }
    }
}

impl eframe::App for GraphAdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.process_notifications();
        self.process_modal_outcome();

        self.show_toolbar(ctx);
        self.show_saved_graphs(ctx);
        self.show_dialog(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// Escape closes an open popup first; only a second press dismisses the dialog.
fn escape_dismisses(escape_pressed: bool, popup_open: bool) -> bool {
    escape_pressed && !popup_open
}

/// Replaces the entry with the same id, or appends.
pub fn upsert_graph(graphs: &mut Vec<Graph>, graph: Graph) {
    match graphs
        .iter_mut()
        .find(|existing| existing.id.is_some() && existing.id == graph.id)
    {
        Some(existing) => *existing = graph,
        None => graphs.push(graph),
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
