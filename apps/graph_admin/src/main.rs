mod backend_bridge;
mod config;
mod controller;
mod ui;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{GraphResource, RestClient, UserDirectory};
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::GraphId;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{
    commands::BackendCommand,
    runtime::{self, BackendServices},
};
use crate::config::{load_settings, Settings};
use crate::controller::events::UiEvent;
use crate::ui::{GraphAdminApp, StartupAction};

#[derive(Parser, Debug)]
#[command(about = "Create and edit saved graph definitions")]
struct Args {
    /// Config file; defaults to ./graph_admin.toml, then the user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Open the edit dialog for this graph id on startup.
    #[arg(long, conflicts_with = "new")]
    edit: Option<i64>,
    /// Open the create dialog on startup.
    #[arg(long)]
    new: bool,
}

impl Args {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.api_base_url = url.clone();
        }
        if let Some(token) = &self.token {
            settings.auth_token = Some(token.clone());
        }
    }

    fn startup_action(&self) -> StartupAction {
        match (self.edit, self.new) {
            (Some(id), _) => StartupAction::Edit(GraphId(id)),
            (None, true) => StartupAction::Create,
            (None, false) => StartupAction::None,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_overrides(&mut settings);
    init_tracing(&settings.log_filter);

    let client = RestClient::new(&settings.client_settings())?;
    tracing::info!(api = %client.base_url(), app = %settings.app_name, "starting graph admin");
    let graphs: Arc<dyn GraphResource> = client.clone();
    let users: Arc<dyn UserDirectory> = client.clone();
    let services = BackendServices {
        graphs,
        users,
        client_events: Some(client.subscribe_events()),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(cmd_rx, ui_tx, services);

    let startup = args.startup_action();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Graph Admin")
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Graph Admin",
        options,
        Box::new(move |_cc| Ok(Box::new(GraphAdminApp::new(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow!("graph admin window failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_flag_selects_edit_startup() {
        let args = Args::parse_from(["graph_admin", "--edit", "7"]);
        assert_eq!(args.startup_action(), StartupAction::Edit(GraphId(7)));
    }

    #[test]
    fn edit_and_new_conflict() {
        assert!(Args::try_parse_from(["graph_admin", "--edit", "7", "--new"]).is_err());
    }

    #[test]
    fn cli_overrides_win_over_loaded_settings() {
        let args = Args::parse_from([
            "graph_admin",
            "--api-url",
            "http://cli:9",
            "--token",
            "abc",
            "--new",
        ]);
        let mut settings = Settings::default();

        args.apply_overrides(&mut settings);

        assert_eq!(settings.api_base_url, "http://cli:9");
        assert_eq!(settings.auth_token.as_deref(), Some("abc"));
        assert_eq!(args.startup_action(), StartupAction::Create);
    }
}
