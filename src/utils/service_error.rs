// Request-facing error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found")]
    NotFound,

    #[error("Domain not found")]
    DomainNotFound,

    #[error("Access denied")]
    AccessDenied,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    GatewayRejected(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Internal server error")]
    InternalError,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ServiceError::DomainNotFound => {
                (StatusCode::NOT_FOUND, "Domain not found".to_string())
            },
            ServiceError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied.".to_string()),
            ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServiceError::GatewayRejected(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::Gateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ServiceError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => ServiceError::NotFound,
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

impl From<crate::services::convomat::ConvomatError> for ServiceError {
    fn from(error: crate::services::convomat::ConvomatError) -> Self {
        use crate::services::convomat::ConvomatError;
        match error {
            ConvomatError::Rejected(msg) => ServiceError::GatewayRejected(msg),
            other => ServiceError::Gateway(other.to_string()),
        }
    }
}

/// Map a bb8 pool checkout failure
pub fn pool_error<E: std::fmt::Display>(error: E) -> ServiceError {
    ServiceError::DatabaseError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: ServiceError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[test]
    fn conflict_keeps_message() {
        let err = ServiceError::Conflict("User a@b.c already exists".to_string());
        assert_eq!(err.to_string(), "User a@b.c already exists");
    }
}
