use serde::{Deserialize, Serialize};

use crate::domain::Graph;

/// Broadcast after a graph has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GraphNotification {
    GraphUpdated { graph: Graph },
}

impl GraphNotification {
    pub fn name(&self) -> &'static str {
        match self {
            GraphNotification::GraphUpdated { .. } => "visualizer2App:graphUpdate",
        }
    }

    pub fn graph(&self) -> &Graph {
        match self {
            GraphNotification::GraphUpdated { graph } => graph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Operator-facing alert raised by the backend through response headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl Alert {
    /// Renders `visualizer2App.graph.created` + `7` as `graph created (7)`.
    pub fn display_text(&self) -> String {
        let mut parts = self.message.split('.').skip(1).collect::<Vec<_>>();
        if parts.is_empty() {
            parts.push(self.message.as_str());
        }
        let text = parts.join(" ");
        match &self.param {
            Some(param) if !param.is_empty() => format!("{text} ({param})"),
            _ => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GraphId;

    #[test]
    fn notification_keeps_event_name_and_payload() {
        let graph = Graph {
            id: Some(GraphId(7)),
            name: Some("A".into()),
            ..Graph::default()
        };
        let notification = GraphNotification::GraphUpdated {
            graph: graph.clone(),
        };

        assert_eq!(notification.name(), "visualizer2App:graphUpdate");
        assert_eq!(notification.graph(), &graph);
    }

    #[test]
    fn alert_text_drops_application_prefix() {
        let alert = Alert {
            level: AlertLevel::Success,
            message: "visualizer2App.graph.created".into(),
            param: Some("7".into()),
        };
        assert_eq!(alert.display_text(), "graph created (7)");

        let bare = Alert {
            level: AlertLevel::Info,
            message: "saved".into(),
            param: None,
        };
        assert_eq!(bare.display_text(), "saved");
    }
}
