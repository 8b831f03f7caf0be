//! Structural checks on inbound bodies. Anything rejected here is a caller bug and surfaces as
//! `MalformedRequest`; the one business rule owned at this layer is split integrity.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::error::GatewayError;
use crate::models::{MarketplacePaymentRequest, PaymentRequest, RefundRequest};

fn malformed(detail: impl Into<String>) -> GatewayError {
    GatewayError::MalformedRequest(detail.into())
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(malformed("request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))
}

fn check_amount(field: &str, amount: i64) -> Result<(), GatewayError> {
    if amount <= 0 {
        return Err(malformed(format!("{field} must be greater than zero")));
    }
    Ok(())
}

fn check_currency(currency: &str) -> Result<(), GatewayError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(malformed("currency must be a three-letter ISO 4217 code"));
    }
    Ok(())
}

pub fn payment(body: &[u8]) -> Result<PaymentRequest, GatewayError> {
    let req: PaymentRequest = decode(body)?;
    check_amount("amount", req.amount)?;
    check_currency(&req.currency)?;
    Ok(req)
}

pub fn refund(body: &[u8]) -> Result<RefundRequest, GatewayError> {
    let req: RefundRequest = decode(body)?;
    if req.payment_id.trim().is_empty() {
        return Err(malformed("payment_id is required"));
    }
    if let Some(amount) = req.amount {
        check_amount("amount", amount)?;
    }
    Ok(req)
}

pub fn marketplace_payment(body: &[u8]) -> Result<MarketplacePaymentRequest, GatewayError> {
    let req: MarketplacePaymentRequest = decode(body)?;
    check_amount("amount", req.amount)?;
    check_currency(&req.currency)?;
    if req.splits.is_empty() {
        return Err(malformed("splits must contain at least one recipient"));
    }
    for (i, split) in req.splits.iter().enumerate() {
        if split.recipient_id.trim().is_empty() {
            return Err(malformed(format!("splits[{i}].recipient_id is required")));
        }
        check_amount(&format!("splits[{i}].amount"), split.amount)?;
    }
    Ok(req)
}

/// Split allocation must be distinct per recipient and must not exceed the declared total.
pub fn check_split_integrity(req: &MarketplacePaymentRequest) -> Result<(), GatewayError> {
    let mut seen = HashSet::new();
    for split in &req.splits {
        if !seen.insert(split.recipient_id.as_str()) {
            return Err(GatewayError::Validation(format!(
                "recipient {} appears in more than one split",
                split.recipient_id
            )));
        }
    }

    let allocated = req
        .splits
        .iter()
        .try_fold(0i64, |acc, s| acc.checked_add(s.amount))
        .ok_or_else(|| GatewayError::Validation("split amounts overflow".into()))?;
    if allocated > req.amount {
        return Err(GatewayError::Validation(format!(
            "split amounts total {allocated} exceeds payment amount {}",
            req.amount
        )));
    }
    Ok(())
}
