use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use models::Envelope;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data yang dikirim tidak valid")]
    MalformedPayload,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Akses ditolak")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Sesi tidak valid. Silakan masuk kembali.".to_string())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        AppError::Unprocessable(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(Envelope::error(self.to_string()))).into_response()
    }
}
