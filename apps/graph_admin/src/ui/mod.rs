//! UI layer for the graph admin: app shell and the graph edit dialog window.

pub mod app;

pub use app::{GraphAdminApp, StartupAction};
