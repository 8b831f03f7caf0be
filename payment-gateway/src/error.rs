use axum::http::StatusCode;
use common_http_errors::ApiError;
use thiserror::Error;

use crate::processor::ProcessorError;

/// Every way a request can fail once it reaches an orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("merchant context missing")]
    MissingMerchantContext,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("processing failed: {0}")]
    Unclassified(String),
}

impl From<ProcessorError> for GatewayError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::Validation(msg) => GatewayError::Validation(msg),
            ProcessorError::Authorization(msg) => GatewayError::Authorization(msg),
            ProcessorError::NotFound(msg) => GatewayError::NotFound(msg),
            ProcessorError::Other(msg) => GatewayError::Unclassified(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePayment,
    GetPayment,
    ListPayments,
    CreateRefund,
    CreateMarketplacePayment,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreatePayment => "create_payment",
            Operation::GetPayment => "get_payment",
            Operation::ListPayments => "list_payments",
            Operation::CreateRefund => "create_refund",
            Operation::CreateMarketplacePayment => "create_marketplace_payment",
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Operation::GetPayment | Operation::ListPayments)
    }

    fn invalid_message(&self) -> &'static str {
        match self {
            Operation::CreatePayment => "Invalid payment request",
            Operation::GetPayment => "Payment ID is required",
            Operation::ListPayments => "Invalid payment listing request",
            Operation::CreateRefund => "Invalid refund request",
            Operation::CreateMarketplacePayment => "Invalid marketplace payment request",
        }
    }

    fn not_found_message(&self) -> &'static str {
        match self {
            Operation::GetPayment | Operation::CreateRefund => "Payment not found",
            _ => "Resource not found",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Operation::CreatePayment => "Payment processing failed",
            Operation::GetPayment => "Internal server error",
            Operation::ListPayments => "Failed to list payments",
            Operation::CreateRefund => "Refund processing failed",
            Operation::CreateMarketplacePayment => "Marketplace payment processing failed",
        }
    }
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::MissingMerchantContext | GatewayError::Authorization(_) => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps the failure onto the wire contract for `op`. Diagnostic text travels in `details`.
    pub fn into_api_error(self, op: Operation) -> ApiError {
        match self {
            GatewayError::MalformedRequest(detail) => {
                ApiError::invalid_request(op.invalid_message(), Some(detail))
            }
            GatewayError::MissingMerchantContext => ApiError::Unauthorized { details: None },
            GatewayError::Authorization(detail) => ApiError::Unauthorized { details: Some(detail) },
            GatewayError::Validation(detail) => ApiError::Validation { details: Some(detail) },
            GatewayError::NotFound(detail) => ApiError::NotFound {
                message: op.not_found_message().into(),
                details: Some(detail),
            },
            GatewayError::Unclassified(detail) => ApiError::Internal {
                code: if op.is_mutating() { "processing_error" } else { "internal_error" },
                message: op.failure_message().into(),
                details: Some(detail),
            },
        }
    }
}
