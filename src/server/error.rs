use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid record source")]
    InvalidSource(anyhow::Error),

    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::InvalidSource(e) => (StatusCode::BAD_REQUEST, format!("{e:#}")),
            AppError::Internal(e) => {
                error!("{e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };

        let body = json!({
            "message": self.to_string(),
            "error": detail,
        });

        (status, Json(body)).into_response()
    }
}
