use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(GraphId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphType {
    Line,
    Column,
    Area,
    Pie,
}

impl GraphType {
    pub const ALL: [GraphType; 4] = [
        GraphType::Line,
        GraphType::Column,
        GraphType::Area,
        GraphType::Pie,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GraphType::Line => "Line",
            GraphType::Column => "Column",
            GraphType::Area => "Area",
            GraphType::Pie => "Pie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserSummary {
    /// Label used by selection controls: the full name when known, the login otherwise.
    pub fn display_label(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last} ({})", self.login),
            (Some(name), None) | (None, Some(name)) => format!("{name} ({})", self.login),
            (None, None) => self.login.clone(),
        }
    }
}

/// A saved chart definition. `id` is `None` until the backend has persisted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub id: Option<GraphId>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub graph_type: Option<GraphType>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Graph {
    pub fn new_unsaved() -> Self {
        Self {
            id: None,
            name: None,
            graph_type: None,
            shared: false,
            user: None,
            created_date: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new_unsaved()
    }
}
