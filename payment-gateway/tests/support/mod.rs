#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use common_security::MerchantId;
use payment_gateway::models::{
    MarketplacePaymentRequest, MarketplacePaymentResponse, PaymentFilter, PaymentListResponse,
    PaymentRequest, PaymentResponse, PaymentStatus, RefundRequest, RefundResponse, SplitResult,
};
use payment_gateway::{
    build_router, AppState, GatewayConfig, PaymentProcessor, ProcessorError, ProcessorResult,
};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Debug, Clone)]
pub enum Call {
    Payment(MerchantId, PaymentRequest),
    Get(MerchantId, String),
    List(PaymentFilter),
    Refund(MerchantId, RefundRequest),
    Marketplace(MerchantId, MarketplacePaymentRequest),
}

/// Processor double that records every call and either echoes the request back or returns a
/// scripted failure.
#[derive(Default)]
pub struct RecordingProcessor {
    calls: Mutex<Vec<Call>>,
    failure: Option<ProcessorError>,
}

impl RecordingProcessor {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn failing(err: ProcessorError) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::default(), failure: Some(err) })
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

    fn record(&self, call: Call) -> ProcessorResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProcessor for RecordingProcessor {
    async fn process_payment(
        &self,
        merchant_id: &MerchantId,
        req: PaymentRequest,
    ) -> ProcessorResult<PaymentResponse> {
        self.record(Call::Payment(merchant_id.clone(), req.clone()))?;
        Ok(PaymentResponse {
            id: "pay_test".into(),
            merchant_id: merchant_id.to_string(),
            amount: req.amount,
            amount_refunded: 0,
            currency: req.currency,
            status: PaymentStatus::Succeeded,
            description: req.description,
            metadata: req.metadata,
            idempotency_key: req.idempotency_key.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }

    async fn get_payment(
        &self,
        merchant_id: &MerchantId,
        payment_id: &str,
    ) -> ProcessorResult<PaymentResponse> {
        self.record(Call::Get(merchant_id.clone(), payment_id.to_string()))?;
        Ok(PaymentResponse {
            id: payment_id.to_string(),
            merchant_id: merchant_id.to_string(),
            amount: 1000,
            amount_refunded: 0,
            currency: "USD".into(),
            status: PaymentStatus::Succeeded,
            description: None,
            metadata: Default::default(),
            idempotency_key: "stored-key".into(),
            created_at: Utc::now(),
        })
    }

    async fn list_payments(&self, filter: PaymentFilter) -> ProcessorResult<PaymentListResponse> {
        self.record(Call::List(filter))?;
        Ok(PaymentListResponse { data: vec![], has_more: false })
    }

    async fn process_refund(
        &self,
        merchant_id: &MerchantId,
        req: RefundRequest,
    ) -> ProcessorResult<RefundResponse> {
        self.record(Call::Refund(merchant_id.clone(), req.clone()))?;
        Ok(RefundResponse {
            id: "re_test".into(),
            payment_id: req.payment_id,
            amount: req.amount.unwrap_or(1000),
            currency: "USD".into(),
            status: "succeeded".into(),
            reason: req.reason,
            idempotency_key: req.idempotency_key.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }

    async fn process_marketplace_payment(
        &self,
        merchant_id: &MerchantId,
        req: MarketplacePaymentRequest,
    ) -> ProcessorResult<MarketplacePaymentResponse> {
        self.record(Call::Marketplace(merchant_id.clone(), req.clone()))?;
        let allocated: i64 = req.splits.iter().map(|s| s.amount).sum();
        Ok(MarketplacePaymentResponse {
            id: "mpay_test".into(),
            amount: req.amount,
            currency: req.currency,
            status: PaymentStatus::Succeeded,
            splits: req
                .splits
                .into_iter()
                .map(|s| SplitResult {
                    recipient_id: s.recipient_id,
                    amount: s.amount,
                    status: "pending".into(),
                })
                .collect(),
            platform_amount: req.amount - allocated,
            idempotency_key: req.idempotency_key.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }
}

pub fn app_with(processor: Arc<dyn PaymentProcessor>, config: GatewayConfig) -> Router {
    build_router(AppState::new(processor, config).unwrap())
}

pub fn app(processor: Arc<dyn PaymentProcessor>) -> Router {
    app_with(processor, GatewayConfig::default())
}

pub fn request(
    method: &str,
    uri: &str,
    merchant: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(merchant) = merchant {
        builder = builder.header("X-Merchant-ID", merchant);
    }
    let body = body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty);
    builder.body(body).unwrap()
}

pub fn get(uri: &str, merchant: Option<&str>) -> Request<Body> {
    request("GET", uri, merchant, None)
}

pub fn post(uri: &str, merchant: Option<&str>, body: Value) -> Request<Body> {
    request("POST", uri, merchant, Some(body))
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// Asserts the common error contract and returns the `error` code.
    pub fn error_code(&self) -> String {
        let code = self.body["error"].as_str().expect("error field").to_string();
        assert_eq!(self.headers.get("X-Error-Code").unwrap(), code.as_str());
        assert!(self.body["message"].is_string());
        code
    }
}

pub async fn send(app: Router, req: Request<Body>) -> Reply {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply { status, headers, body }
}
