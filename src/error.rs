//! Error types and handling for the trip planner

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum TripPlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// LLM provider errors
    #[error("LLM error: {message}")]
    Llm { message: String },

    /// Email delivery errors
    #[error("Email error: {message}")]
    Email { message: String },

    /// Request refused, e.g. a plan whose signature does not verify
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Template or document rendering errors
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TripPlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new LLM error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a new email error
    pub fn email<S: Into<String>>(message: S) -> Self {
        Self::Email {
            message: message.into(),
        }
    }

    /// Create a new forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripPlannerError::Config { message } => {
                format!("Service not configured: {message}. Please contact the administrator.")
            }
            TripPlannerError::Validation { message } => message.clone(),
            TripPlannerError::Llm { message } => {
                format!("Failed to generate trip plan: {message}")
            }
            TripPlannerError::Email { message } => {
                format!("Failed to send email: {message}")
            }
            TripPlannerError::Forbidden { message } => message.clone(),
            TripPlannerError::Render { .. } => {
                "Could not prepare your trip report. Please try again.".to_string()
            }
            TripPlannerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripPlannerError::General { message } => message.clone(),
        }
    }

    /// HTTP status used when this error reaches a client
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            TripPlannerError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TripPlannerError::Forbidden { .. } => StatusCode::FORBIDDEN,
            TripPlannerError::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TripPlannerError::Llm { .. } | TripPlannerError::Email { .. } => {
                StatusCode::BAD_GATEWAY
            }
            TripPlannerError::Render { .. }
            | TripPlannerError::Io { .. }
            | TripPlannerError::General { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<askama::Error> for TripPlannerError {
    fn from(err: askama::Error) -> Self {
        TripPlannerError::render(err.to_string())
    }
}

impl IntoResponse for TripPlannerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
