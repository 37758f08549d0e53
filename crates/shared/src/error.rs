use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::Validation,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub message: String,
}

/// Error body returned by the admin backend, e.g. `{"message":"error.validation", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: None,
            field_errors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Human readable summary: the description when present, then any field errors.
    pub fn summary(&self) -> String {
        let mut summary = self
            .description
            .clone()
            .unwrap_or_else(|| self.message.clone());
        for field_error in &self.field_errors {
            summary.push_str(&format!(
                "; {}.{}: {}",
                field_error.object_name, field_error.field, field_error.message
            ));
        }
        summary
    }
}

#[derive(Debug, Error)]
#[error("{code:?} ({status}): {}", .error.summary())]
pub struct ApiException {
    pub code: ErrorCode,
    pub status: u16,
    pub error: ApiError,
}

impl ApiException {
    pub fn new(status: u16, error: ApiError) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            error,
        }
    }
}
