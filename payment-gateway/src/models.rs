//! Request and response values exchanged between the HTTP surface, the orchestrators and the
//! payment processor. All of them live for a single request.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common_security::MerchantId;
use serde::{Deserialize, Serialize};

pub type Metadata = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub payment_id: String,
    /// Absent means a full refund of the remaining amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub recipient_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePaymentRequest {
    pub amount: i64,
    pub currency: String,
    pub splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Behaviour shared by the three mutating request bodies. The `with_*` methods consume the
/// value and hand back a new one so enrichment never edits a caller-owned request in place.
pub trait MutatingRequest: Sized {
    fn idempotency_key(&self) -> Option<&str>;
    fn with_idempotency_key(self, key: String) -> Self;
    fn metadata(&self) -> &Metadata;
    fn with_metadata(self, metadata: Metadata) -> Self;
}

macro_rules! impl_mutating_request {
    ($($ty:ty),+) => {$(
        impl MutatingRequest for $ty {
            fn idempotency_key(&self) -> Option<&str> { self.idempotency_key.as_deref() }
            fn with_idempotency_key(self, key: String) -> Self {
                Self { idempotency_key: Some(key), ..self }
            }
            fn metadata(&self) -> &Metadata { &self.metadata }
            fn with_metadata(self, metadata: Metadata) -> Self { Self { metadata, ..self } }
        }
    )+};
}

impl_mutating_request!(PaymentRequest, RefundRequest, MarketplacePaymentRequest);

/// Normalized listing filter. `merchant_id` always comes from the authenticated context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentFilter {
    pub merchant_id: MerchantId,
    pub limit: u32,
    pub starting_after: Option<String>,
    pub ending_before: Option<String>,
    pub status: Option<String>,
    /// Inclusive lower bound.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub merchant_id: String,
    pub amount: i64,
    pub amount_refunded: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub data: Vec<PaymentResponse>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResponse {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub recipient_id: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePaymentResponse {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub splits: Vec<SplitResult>,
    /// Portion of the total not allocated to any recipient.
    pub platform_amount: i64,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}
