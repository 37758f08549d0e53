//! Controller layer: UI events, the graph edit dialog, and command orchestration.

pub mod dialog;
pub mod events;
pub mod orchestration;
