//! In-process `PaymentProcessor` used by the binary for local runs and by tests.
//!
//! Payments are kept per merchant in insertion order. Replays of an idempotency key return the
//! stored result instead of executing twice; a replay with different parameters is refused.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use common_security::MerchantId;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    MarketplacePaymentRequest, MarketplacePaymentResponse, PaymentFilter, PaymentListResponse,
    PaymentRequest, PaymentResponse, PaymentStatus, RefundRequest, RefundResponse, Split,
    SplitResult,
};
use crate::processor::{PaymentProcessor, ProcessorError, ProcessorResult};

type KeyIndex<T> = HashMap<(MerchantId, String), T>;

#[derive(Default)]
struct Ledger {
    payments: HashMap<String, PaymentResponse>,
    order: Vec<String>,
    payment_keys: KeyIndex<(i64, String, String)>,
    refund_keys: KeyIndex<(String, Option<i64>, RefundResponse)>,
    marketplace_keys: KeyIndex<(Vec<Split>, MarketplacePaymentResponse)>,
}

#[derive(Default)]
pub struct InMemoryProcessor {
    ledger: Mutex<Ledger>,
}

impl InMemoryProcessor {
    pub fn new() -> Self { Self::default() }

    fn ledger(&self) -> ProcessorResult<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| ProcessorError::Other("payment ledger unavailable".into()))
    }
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

fn require_key(key: Option<String>) -> ProcessorResult<String> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| ProcessorError::Validation("idempotency key is required".into()))
}

fn key_reused(key: &str) -> ProcessorError {
    ProcessorError::Validation(format!(
        "idempotency key '{key}' was already used with different parameters"
    ))
}

fn payment_not_found(payment_id: &str) -> ProcessorError {
    ProcessorError::NotFound(format!("payment {payment_id} not found"))
}

impl Ledger {
    fn owned(&self, merchant_id: &MerchantId, payment_id: &str) -> Option<&PaymentResponse> {
        self.payments
            .get(payment_id)
            .filter(|p| p.merchant_id == merchant_id.as_str())
    }

    fn insert(&mut self, payment: PaymentResponse) {
        self.order.push(payment.id.clone());
        self.payments.insert(payment.id.clone(), payment);
    }

    /// Merchant's payments matching the filter, newest first.
    fn matching(&self, filter: &PaymentFilter) -> Vec<&PaymentResponse> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.payments.get(id))
            .filter(|p| p.merchant_id == filter.merchant_id.as_str())
            .filter(|p| filter.status.as_deref().map_or(true, |s| p.status.as_str() == s))
            .filter(|p| filter.created_after.map_or(true, |after| p.created_at >= after))
            .filter(|p| filter.created_before.map_or(true, |before| p.created_at < before))
            .collect()
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryProcessor {
    async fn process_payment(
        &self,
        merchant_id: &MerchantId,
        req: PaymentRequest,
    ) -> ProcessorResult<PaymentResponse> {
        let key = require_key(req.idempotency_key.clone())?;
        let mut ledger = self.ledger()?;
        let index = (merchant_id.clone(), key.clone());
        if let Some((amount, currency, payment_id)) = ledger.payment_keys.get(&index) {
            if *amount != req.amount || *currency != req.currency {
                return Err(key_reused(&key));
            }
            debug!(merchant_id = %merchant_id, idempotency_key = %key, "replaying stored payment");
            return ledger
                .payments
                .get(payment_id)
                .cloned()
                .ok_or_else(|| payment_not_found(payment_id));
        }

        let payment = PaymentResponse {
            id: new_id("pay"),
            merchant_id: merchant_id.to_string(),
            amount: req.amount,
            amount_refunded: 0,
            currency: req.currency.clone(),
            status: PaymentStatus::Succeeded,
            description: req.description,
            metadata: req.metadata,
            idempotency_key: key,
            created_at: Utc::now(),
        };
        ledger.payment_keys.insert(index, (req.amount, req.currency, payment.id.clone()));
        ledger.insert(payment.clone());
        Ok(payment)
    }

    async fn get_payment(
        &self,
        merchant_id: &MerchantId,
        payment_id: &str,
    ) -> ProcessorResult<PaymentResponse> {
        let ledger = self.ledger()?;
        ledger
            .owned(merchant_id, payment_id)
            .cloned()
            .ok_or_else(|| payment_not_found(payment_id))
    }

    async fn list_payments(&self, filter: PaymentFilter) -> ProcessorResult<PaymentListResponse> {
        let ledger = self.ledger()?;
        let matching = ledger.matching(&filter);
        let limit = filter.limit.max(1) as usize;
        let position = |cursor: &str| {
            matching
                .iter()
                .position(|p| p.id == cursor)
                .ok_or_else(|| payment_not_found(cursor))
        };

        let (page, has_more) = if let Some(cursor) = filter.starting_after.as_deref() {
            let rest = &matching[position(cursor)? + 1..];
            (rest.iter().take(limit).collect::<Vec<_>>(), rest.len() > limit)
        } else if let Some(cursor) = filter.ending_before.as_deref() {
            let before = &matching[..position(cursor)?];
            let start = before.len().saturating_sub(limit);
            (before[start..].iter().collect(), start > 0)
        } else {
            (matching.iter().take(limit).collect(), matching.len() > limit)
        };

        Ok(PaymentListResponse {
            data: page.into_iter().map(|p| (*p).clone()).collect(),
            has_more,
        })
    }

    async fn process_refund(
        &self,
        merchant_id: &MerchantId,
        req: RefundRequest,
    ) -> ProcessorResult<RefundResponse> {
        let key = require_key(req.idempotency_key.clone())?;
        let mut ledger = self.ledger()?;
        let index = (merchant_id.clone(), key.clone());
        if let Some((payment_id, amount, refund)) = ledger.refund_keys.get(&index) {
            if *payment_id != req.payment_id || *amount != req.amount {
                return Err(key_reused(&key));
            }
            return Ok(refund.clone());
        }

        let payment = ledger
            .owned(merchant_id, &req.payment_id)
            .cloned()
            .ok_or_else(|| payment_not_found(&req.payment_id))?;
        let remaining = payment.amount - payment.amount_refunded;
        if remaining <= 0 {
            return Err(ProcessorError::Validation(format!(
                "payment {} is already fully refunded",
                payment.id
            )));
        }
        let amount = req.amount.unwrap_or(remaining);
        if amount > remaining {
            return Err(ProcessorError::Validation(format!(
                "refund amount {amount} exceeds refundable amount {remaining}"
            )));
        }

        let refunded = payment.amount_refunded + amount;
        if let Some(stored) = ledger.payments.get_mut(&payment.id) {
            stored.amount_refunded = refunded;
            stored.status = if refunded == stored.amount {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            };
        }

        let refund = RefundResponse {
            id: new_id("re"),
            payment_id: payment.id,
            amount,
            currency: payment.currency,
            status: "succeeded".into(),
            reason: req.reason,
            idempotency_key: key,
            created_at: Utc::now(),
        };
        ledger.refund_keys.insert(index, (req.payment_id, req.amount, refund.clone()));
        Ok(refund)
    }

    async fn process_marketplace_payment(
        &self,
        merchant_id: &MerchantId,
        req: MarketplacePaymentRequest,
    ) -> ProcessorResult<MarketplacePaymentResponse> {
        let key = require_key(req.idempotency_key.clone())?;
        let mut ledger = self.ledger()?;
        let index = (merchant_id.clone(), key.clone());
        if let Some((splits, stored)) = ledger.marketplace_keys.get(&index) {
            if *splits != req.splits
                || stored.amount != req.amount
                || stored.currency != req.currency
            {
                return Err(key_reused(&key));
            }
            return Ok(stored.clone());
        }

        let allocated = req
            .splits
            .iter()
            .try_fold(0i64, |acc, s| acc.checked_add(s.amount))
            .filter(|sum| *sum <= req.amount)
            .ok_or_else(|| {
                ProcessorError::Validation("split amounts exceed the payment total".into())
            })?;

        let created_at = Utc::now();
        let response = MarketplacePaymentResponse {
            id: new_id("mpay"),
            amount: req.amount,
            currency: req.currency.clone(),
            status: PaymentStatus::Succeeded,
            splits: req
                .splits
                .iter()
                .map(|s| SplitResult {
                    recipient_id: s.recipient_id.clone(),
                    amount: s.amount,
                    status: "transferred".into(),
                })
                .collect(),
            platform_amount: req.amount - allocated,
            idempotency_key: key.clone(),
            created_at,
        };
        ledger.insert(PaymentResponse {
            id: response.id.clone(),
            merchant_id: merchant_id.to_string(),
            amount: req.amount,
            amount_refunded: 0,
            currency: req.currency,
            status: PaymentStatus::Succeeded,
            description: req.description,
            metadata: req.metadata,
            idempotency_key: key,
            created_at,
        });
        ledger.marketplace_keys.insert(index, (req.splits, response.clone()));
        Ok(response)
    }
}
