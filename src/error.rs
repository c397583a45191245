/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / AuthError / ConfigError を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

/// `{ "success": false, "error": <status>, "message": <text> }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("unprocessable: {0}")]
    Unprocessable(&'static str),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(err) => err.status(),
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, code) = match &self {
            AppError::Auth(err) => (err.to_string(), Some(err.code())),
            AppError::BadRequest(_) => ("bad request".to_string(), None),
            AppError::NotFound => ("ressource not found".to_string(), None),
            AppError::MethodNotAllowed => ("method not allowed".to_string(), None),
            AppError::Unprocessable(_) => ("unprocessable".to_string(), None),
            AppError::Internal => ("internal server error".to_string(), None),
        };

        let body = ErrorResponse {
            success: false,
            error: status.as_u16(),
            message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        tracing::error!(error = %e, "configuration error");
        AppError::Internal
    }
}
