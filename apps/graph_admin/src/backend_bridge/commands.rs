//! Backend commands queued from UI to backend worker.

use shared::domain::{Graph, GraphId};

use crate::controller::dialog::{DialogId, SaveTicket};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    ResolveGraph {
        id: GraphId,
    },
    ListUsers {
        dialog: DialogId,
    },
    CreateGraph {
        ticket: SaveTicket,
        graph: Graph,
    },
    UpdateGraph {
        ticket: SaveTicket,
        graph: Graph,
    },
}
