//! Error taxonomy shared by every marketplace operation.
//!
//! Services return `Result<T, MarketError>`; the Rocket responder below is the
//! single place where those results become HTTP statuses and JSON bodies.

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use thiserror::Error;

use crate::config::app_config::AppConfig;
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum MarketError {
    /// Missing or malformed input the caller can correct.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule was violated.
    #[error("{message}")]
    Conflict {
        field: Option<String>,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    /// The caller does not own the resource.
    #[error("{0}")]
    Forbidden(String),

    /// Store or collaborator failure; detail is only shown in development.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(field: Option<&str>, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::Conflict { .. } => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Forbidden(_) => Status::Forbidden,
            Self::Internal(_) => Status::InternalServerError,
        }
    }

    fn body(&self, expose_internal: bool) -> ErrorBody {
        match self {
            Self::Internal(detail) => ErrorBody {
                message: "Internal server error".to_string(),
                field: None,
                error: expose_internal.then(|| detail.clone()),
            },
            Self::Conflict { field, message } => ErrorBody {
                message: message.clone(),
                field: field.clone(),
                error: None,
            },
            other => ErrorBody {
                message: other.to_string(),
                field: None,
                error: None,
            },
        }
    }
}

impl From<RepositoryError> for MarketError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(field) => Self::Conflict {
                message: "Duplicate key error".to_string(),
                field: Some(field),
            },
            RepositoryError::Database(err) => Self::internal(err),
        }
    }
}

/// Success envelope used by every route.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, result: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            result: Some(result),
        })
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
            field: None,
            error: None,
        })
    }
}

impl<'r> Responder<'r, 'static> for MarketError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let expose_internal = request
            .rocket()
            .state::<AppConfig>()
            .map_or(false, AppConfig::is_development);
        let status = self.status();
        if status == Status::InternalServerError {
            tracing::error!(error = %self, uri = %request.uri(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.code, "request rejected");
        }
        (status, Json(self.body(expose_internal))).respond_to(request)
    }
}
