//! Per-operation pipelines: merchant, body validation, idempotency key, enrichment, processor
//! call, classification. Steps run strictly in that order and stop at the first failure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::error::Elapsed;
use common_security::MerchantContext;
use tracing::{info, warn};

use crate::context::{self, InboundRequest};
use crate::error::{GatewayError, Operation};
use crate::filter;
use crate::idempotency;
use crate::metrics::{PROCESSOR_CALLS_TOTAL, PROCESSOR_CALL_DURATION};
use crate::models::{
    MarketplacePaymentResponse, PaymentListResponse, PaymentResponse, RefundResponse,
};
use crate::processor::{PaymentProcessor, ProcessorError, ProcessorResult};
use crate::validation;

#[derive(Clone)]
pub struct PaymentOrchestrator {
    processor: Arc<dyn PaymentProcessor>,
    processor_timeout: Duration,
}

fn outcome_label<T>(outcome: &Result<ProcessorResult<T>, Elapsed>) -> &'static str {
    match outcome {
        Ok(Ok(_)) => "ok",
        Ok(Err(ProcessorError::Validation(_))) => "validation",
        Ok(Err(ProcessorError::Authorization(_))) => "authorization",
        Ok(Err(ProcessorError::NotFound(_))) => "not_found",
        Ok(Err(ProcessorError::Other(_))) => "error",
        Err(_) => "timeout",
    }
}

impl PaymentOrchestrator {
    pub fn new(processor: Arc<dyn PaymentProcessor>, processor_timeout: Duration) -> Self {
        Self { processor, processor_timeout }
    }

    /// Runs one processor call under the configured deadline. Dropping the returned future
    /// drops the processor call with it.
    async fn invoke<T, F>(&self, op: Operation, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = ProcessorResult<T>>,
    {
        let timer = PROCESSOR_CALL_DURATION.with_label_values(&[op.as_str()]).start_timer();
        let outcome = tokio::time::timeout(self.processor_timeout, call).await;
        timer.observe_duration();

        PROCESSOR_CALLS_TOTAL.with_label_values(&[op.as_str(), outcome_label(&outcome)]).inc();

        match outcome {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => Err(GatewayError::Unclassified(format!(
                "payment processor did not respond within {}ms",
                self.processor_timeout.as_millis()
            ))),
        }
    }

    pub async fn create_payment(
        &self,
        inbound: &InboundRequest,
        body: &[u8],
    ) -> Result<PaymentResponse, GatewayError> {
        let op = Operation::CreatePayment;
        let merchant_id = context::resolve_merchant(inbound.merchant.as_ref())?;
        let req = validation::payment(body)?;
        let (req, generated) = idempotency::resolve(req, inbound.idempotency_header.key()?)?;
        let req = context::enrich(req, &inbound.metadata);
        let key = req.idempotency_key.clone().unwrap_or_default();

        match self.invoke(op, self.processor.process_payment(&merchant_id, req)).await {
            Ok(payment) => {
                info!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    generated_key = generated,
                    payment_id = %payment.id,
                    "payment created"
                );
                Ok(payment)
            }
            Err(err) => {
                warn!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    error = %err,
                    "payment creation failed"
                );
                Err(err)
            }
        }
    }

    pub async fn get_payment(
        &self,
        merchant: Option<&MerchantContext>,
        payment_id: &str,
    ) -> Result<PaymentResponse, GatewayError> {
        let op = Operation::GetPayment;
        let merchant_id = context::resolve_merchant(merchant)?;
        if payment_id.trim().is_empty() {
            return Err(GatewayError::MalformedRequest("payment id path segment is empty".into()));
        }

        self.invoke(op, self.processor.get_payment(&merchant_id, payment_id))
            .await
            .inspect_err(|err| {
                warn!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    payment_id,
                    error = %err,
                    "payment lookup failed"
                )
            })
    }

    pub async fn list_payments(
        &self,
        merchant: Option<&MerchantContext>,
        params: &HashMap<String, String>,
    ) -> Result<PaymentListResponse, GatewayError> {
        let op = Operation::ListPayments;
        let merchant_id = context::resolve_merchant(merchant)?;
        let filter = filter::build(&merchant_id, params, Utc::now())?;

        self.invoke(op, self.processor.list_payments(filter))
            .await
            .inspect_err(|err| {
                warn!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    error = %err,
                    "payment listing failed"
                )
            })
    }

    pub async fn create_refund(
        &self,
        inbound: &InboundRequest,
        body: &[u8],
    ) -> Result<RefundResponse, GatewayError> {
        let op = Operation::CreateRefund;
        let merchant_id = context::resolve_merchant(inbound.merchant.as_ref())?;
        let req = validation::refund(body)?;
        let (req, generated) = idempotency::resolve(req, inbound.idempotency_header.key()?)?;
        let req = context::enrich(req, &inbound.metadata);
        let key = req.idempotency_key.clone().unwrap_or_default();
        let payment_id = req.payment_id.clone();

        match self.invoke(op, self.processor.process_refund(&merchant_id, req)).await {
            Ok(refund) => {
                info!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    generated_key = generated,
                    payment_id = %payment_id,
                    refund_id = %refund.id,
                    "refund created"
                );
                Ok(refund)
            }
            Err(err) => {
                warn!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    payment_id = %payment_id,
                    error = %err,
                    "refund failed"
                );
                Err(err)
            }
        }
    }

    pub async fn create_marketplace_payment(
        &self,
        inbound: &InboundRequest,
        body: &[u8],
    ) -> Result<MarketplacePaymentResponse, GatewayError> {
        let op = Operation::CreateMarketplacePayment;
        let merchant_id = context::resolve_merchant(inbound.merchant.as_ref())?;
        let req = validation::marketplace_payment(body)?;
        if let Err(err) = validation::check_split_integrity(&req) {
            warn!(
                operation = op.as_str(),
                merchant_id = %merchant_id,
                error = %err,
                "split allocation rejected"
            );
            return Err(err);
        }
        let (req, generated) = idempotency::resolve(req, inbound.idempotency_header.key()?)?;
        let req = context::enrich(req, &inbound.metadata);
        let key = req.idempotency_key.clone().unwrap_or_default();

        match self.invoke(op, self.processor.process_marketplace_payment(&merchant_id, req)).await {
            Ok(payment) => {
                info!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    generated_key = generated,
                    payment_id = %payment.id,
                    splits = payment.splits.len(),
                    "marketplace payment created"
                );
                Ok(payment)
            }
            Err(err) => {
                warn!(
                    operation = op.as_str(),
                    merchant_id = %merchant_id,
                    idempotency_key = %key,
                    error = %err,
                    "marketplace payment failed"
                );
                Err(err)
            }
        }
    }
}
