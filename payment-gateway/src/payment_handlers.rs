use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use common_http_errors::{ApiError, ApiResult};

use crate::app::AppState;
use crate::context::InboundRequest;
use crate::error::{GatewayError, Operation};
use crate::models::{
    MarketplacePaymentResponse, PaymentListResponse, PaymentResponse, RefundResponse,
};

/// Extractor failures are reported after the merchant check, so a caller without a merchant
/// context always gets 401 whatever else is wrong with the request.
fn rejected(inbound: &InboundRequest, detail: String, op: Operation) -> ApiError {
    let err = match inbound.merchant {
        None => GatewayError::MissingMerchantContext,
        Some(_) => GatewayError::MalformedRequest(detail),
    };
    err.into_api_error(op)
}

fn read_body(
    inbound: &InboundRequest,
    body: Result<Bytes, BytesRejection>,
    op: Operation,
) -> ApiResult<Bytes> {
    body.map_err(|rejection| rejected(inbound, rejection.body_text(), op))
}

pub async fn create_payment(
    State(state): State<AppState>,
    inbound: InboundRequest,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let op = Operation::CreatePayment;
    let body = read_body(&inbound, body, op)?;
    let payment = state
        .orchestrator
        .create_payment(&inbound, &body)
        .await
        .map_err(|e| e.into_api_error(op))?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    inbound: InboundRequest,
    payment_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PaymentResponse>> {
    let op = Operation::GetPayment;
    let Path(payment_id) =
        payment_id.map_err(|rejection| rejected(&inbound, rejection.body_text(), op))?;
    let payment = state
        .orchestrator
        .get_payment(inbound.merchant.as_ref(), &payment_id)
        .await
        .map_err(|e| e.into_api_error(op))?;
    Ok(Json(payment))
}

/// Unparseable query strings are treated as carrying no parameters; every listing parameter
/// has a lenient default.
pub async fn list_payments(
    State(state): State<AppState>,
    inbound: InboundRequest,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Json<PaymentListResponse>> {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let list = state
        .orchestrator
        .list_payments(inbound.merchant.as_ref(), &params)
        .await
        .map_err(|e| e.into_api_error(Operation::ListPayments))?;
    Ok(Json(list))
}

pub async fn create_refund(
    State(state): State<AppState>,
    inbound: InboundRequest,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<RefundResponse>)> {
    let op = Operation::CreateRefund;
    let body = read_body(&inbound, body, op)?;
    let refund = state
        .orchestrator
        .create_refund(&inbound, &body)
        .await
        .map_err(|e| e.into_api_error(op))?;
    Ok((StatusCode::CREATED, Json(refund)))
}

pub async fn create_marketplace_payment(
    State(state): State<AppState>,
    inbound: InboundRequest,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<MarketplacePaymentResponse>)> {
    let op = Operation::CreateMarketplacePayment;
    let body = read_body(&inbound, body, op)?;
    let payment = state
        .orchestrator
        .create_marketplace_payment(&inbound, &body)
        .await
        .map_err(|e| e.into_api_error(op))?;
    Ok((StatusCode::CREATED, Json(payment)))
}
