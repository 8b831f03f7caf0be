use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Wire shape of every error emitted by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")] pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidRequest { message: String, details: Option<String> },
    Unauthorized { details: Option<String> },
    Validation { details: Option<String> },
    NotFound { message: String, details: Option<String> },
    Internal { code: &'static str, message: String, details: Option<String> },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self::InvalidRequest { message: message.into(), details }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable category, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest { .. } => "invalid_request",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Validation { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Internal { code, .. } => code,
        }
    }

    pub fn into_body(self) -> ErrorBody {
        let error = self.code().to_string();
        let (message, details) = match self {
            ApiError::InvalidRequest { message, details } => (message, details),
            ApiError::Unauthorized { details } => ("Unauthorized request".to_string(), details),
            ApiError::Validation { details } => ("Validation failed".to_string(), details),
            ApiError::NotFound { message, details } => (message, details),
            ApiError::Internal { message, details, .. } => (message, details),
        };
        ErrorBody { error, message, details: details.filter(|d| !d.is_empty()) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let mut resp = (status, Json(self.into_body())).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
