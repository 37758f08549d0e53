//! UI/backend events and error modeling for the graph admin controller.

use client_core::ClientError;
use shared::{
    domain::{Graph, UserSummary},
    error::{ApiError, ErrorCode},
    protocol::Alert,
};

use crate::controller::dialog::{DialogId, SaveTicket};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    Alert(Alert),
    GraphResolved(Graph),
    Dialog(DialogEvent),
}

/// Outcomes addressed to one open dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    UsersLoaded {
        dialog: DialogId,
        users: Vec<UserSummary>,
    },
    SaveSettled {
        ticket: SaveTicket,
        outcome: Result<Graph, UiError>,
    },
}

impl DialogEvent {
    pub fn dialog(&self) -> DialogId {
        match self {
            DialogEvent::UsersLoaded { dialog, .. } => *dialog,
            DialogEvent::SaveSettled { ticket, .. } => ticket.dialog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Conflict,
    NotFound,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ResolveGraph,
    SaveGraph,
    ListUsers,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("session expired")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("conflict") || message_lower.contains("concurrency") {
            UiErrorCategory::Conflict
        } else if message_lower.contains("not found") || message_lower.contains("404") {
            UiErrorCategory::NotFound
        } else if message_lower.contains("invalid")
            || message_lower.contains("validation")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
            || message_lower.contains("queue")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Classifies by HTTP status when the backend answered, by message otherwise.
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        match err {
            ClientError::Api(exception) => {
                Self::from_api_error(context, exception.status, &exception.error)
            }
            ClientError::Transport(_) | ClientError::Unavailable(_) => Self {
                category: UiErrorCategory::Transport,
                context,
                message: err.to_string(),
            },
            ClientError::InvalidRequest(_) | ClientError::InvalidUrl(_) => Self {
                category: UiErrorCategory::Validation,
                context,
                message: err.to_string(),
            },
        }
    }

    pub fn from_api_error(context: UiErrorContext, status: u16, error: &ApiError) -> Self {
        let category = match ErrorCode::from_status(status) {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => UiErrorCategory::Auth,
            ErrorCode::NotFound => UiErrorCategory::NotFound,
            ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::Conflict => UiErrorCategory::Conflict,
            ErrorCode::RateLimited => UiErrorCategory::Transport,
            ErrorCode::Internal => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: error.summary(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the generic error banner.
    pub fn banner_text(&self) -> String {
        match self.category {
            UiErrorCategory::Auth => {
                format!("Not authorized: {}. Check the configured API token.", self.message)
            }
            UiErrorCategory::Transport => format!("Server unreachable: {}", self.message),
            UiErrorCategory::NotFound => format!("Not found: {}", self.message),
            UiErrorCategory::Conflict => {
                format!("{} (the entity changed on the server; reload it)", self.message)
            }
            UiErrorCategory::Validation | UiErrorCategory::Unknown => self.message.clone(),
        }
    }
}
