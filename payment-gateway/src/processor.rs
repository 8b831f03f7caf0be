use async_trait::async_trait;
use common_security::MerchantId;
use thiserror::Error;

use crate::models::{
    MarketplacePaymentRequest, MarketplacePaymentResponse, PaymentFilter, PaymentListResponse,
    PaymentRequest, PaymentResponse, RefundRequest, RefundResponse,
};

/// Failure reported by the payment processor. The variant is the classification; the message
/// is opaque diagnostic text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Business-logic collaborator. Implementations enforce at-most-once execution per
/// `(merchant, idempotency key)`; callers never hold a lock on behalf of a key.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process_payment(
        &self,
        merchant_id: &MerchantId,
        req: PaymentRequest,
    ) -> ProcessorResult<PaymentResponse>;
    async fn get_payment(
        &self,
        merchant_id: &MerchantId,
        payment_id: &str,
    ) -> ProcessorResult<PaymentResponse>;
    async fn list_payments(&self, filter: PaymentFilter) -> ProcessorResult<PaymentListResponse>;
    async fn process_refund(
        &self,
        merchant_id: &MerchantId,
        req: RefundRequest,
    ) -> ProcessorResult<RefundResponse>;
    async fn process_marketplace_payment(
        &self,
        merchant_id: &MerchantId,
        req: MarketplacePaymentRequest,
    ) -> ProcessorResult<MarketplacePaymentResponse>;
}
