//! Error handling module
//!
//! Defines the application error taxonomy and its mapping onto HTTP
//! responses for the streamable HTTP transport.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The backend could not be reached (network or I/O failure)
    #[error("SearXNG backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered with a non-success HTTP status
    #[error("SearXNG backend error: {status} {status_text}")]
    Backend { status: u16, status_text: String },

    /// A response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The client sent something we refuse to parse
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Request body exceeded the configured size limit
    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// Session id not present in the registry
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Protocol connection could not be established for a new session
    #[error("Transport establishment failed: {0}")]
    Establishment(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// HTTP status mapping
impl From<&AppError> for StatusCode {
    fn from(err: &AppError) -> StatusCode {
        match err {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Establishment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// JSON-RPC error code used in transport-level error bodies
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            AppError::Decode(_) => -32700,
            AppError::Validation(_) => -32600,
            AppError::SessionNotFound(_) => -32001,
            _ => -32603,
        }
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        let body = Json(RpcErrorBody::new(self.jsonrpc_code(), &self.to_string()));
        (status, body).into_response()
    }
}

/// JSON-RPC 2.0 error envelope used for transport-level error bodies
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub jsonrpc: String,
    pub error: RpcErrorDetail,
    pub id: Option<serde_json::Value>,
}

/// Error member of the JSON-RPC envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcErrorDetail {
    pub code: i64,
    pub message: String,
}

impl RpcErrorBody {
    /// Create a new error envelope with a null id
    pub fn new(code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            error: RpcErrorDetail {
                code,
                message: message.to_string(),
            },
            id: None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
