use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coachline_core::CoreError;
use coachline_reservation::{MapperError, RegistryError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    UpstreamError(u16, String),
    RenderError(String),
    InternalServerError(String),
}

impl AppError {
    pub fn internal(message: impl std::fmt::Display) -> Self {
        AppError::InternalServerError(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::UpstreamError(status, msg) => {
                tracing::error!("Upstream failure ({}): {}", status, msg);
                (StatusCode::BAD_GATEWAY, format!("Upstream failure: {}", msg))
            }
            AppError::RenderError(msg) => {
                tracing::error!("Render failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Ticket rendering failed".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::ValidationError(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::Upstream { status, message } => AppError::UpstreamError(status, message),
            CoreError::Render(msg) => AppError::RenderError(msg),
            // Cache integrity problems are handled as misses before they
            // reach a handler; one leaking this far is an internal bug.
            CoreError::CacheIntegrity(msg) | CoreError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => AppError::NotFoundError(format!("reservation {}", id)),
            RegistryError::Store(e) => AppError::internal(e),
        }
    }
}

impl From<MapperError> for AppError {
    fn from(err: MapperError) -> Self {
        match err {
            MapperError::PaymentNotConfirmed(pnr) => {
                AppError::ValidationError(format!("payment not confirmed for {}", pnr))
            }
            MapperError::Store(e) => AppError::internal(e),
        }
    }
}
