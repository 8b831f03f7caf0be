use common_http_errors::ApiError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("merchant context missing")]    MissingMerchantContext,
    #[error("merchant identifier is empty")] EmptyMerchantId,
    #[error("merchant identifier '{0}' is malformed")] MalformedMerchantId(String),
}

impl From<SecurityError> for ApiError {
    fn from(e: SecurityError) -> Self {
        match e {
            // Never echo why the identity was absent.
            SecurityError::MissingMerchantContext => ApiError::Unauthorized { details: None },
            other => ApiError::Unauthorized { details: Some(other.to_string()) },
        }
    }
}
