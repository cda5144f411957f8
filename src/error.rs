use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::records::RecordKind;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{kind} record not found: {id}")]
    RecordNotFound { kind: RecordKind, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt data file {path}: {reason}")]
    CorruptStore { path: String, reason: String },

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntakeError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            IntakeError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            IntakeError::InvalidInput(_) => "INVALID_INPUT",
            IntakeError::CorruptStore { .. } => "CORRUPT_STORE",
            IntakeError::BackupNotFound(_) => "BACKUP_NOT_FOUND",
            IntakeError::ConfigError(_) => "CONFIG_ERROR",
            IntakeError::ServerError(_) => "SERVER_ERROR",
            IntakeError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::RecordNotFound { .. } | IntakeError::BackupNotFound(_) => {
                StatusCode::NOT_FOUND
            },
            IntakeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IntakeError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(self.to_error_response())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
