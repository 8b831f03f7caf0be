mod support;

use std::sync::Arc;

use axum::http::StatusCode;
use payment_gateway::{InMemoryProcessor, ProcessorError};
use serde_json::json;
use support::{app, get, post, send, Call, RecordingProcessor};

const REFUNDS: &str = "/v2/refunds";

#[tokio::test]
async fn refund_is_created_with_generated_key() {
    let processor = RecordingProcessor::new();
    let body = json!({"payment_id": "pay_1", "amount": 250});
    let reply = send(app(processor.clone()), post(REFUNDS, Some("merch_1"), body)).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    match &processor.calls()[0] {
        Call::Refund(merchant, req) => {
            assert_eq!(merchant.as_str(), "merch_1");
            assert_eq!(req.payment_id, "pay_1");
            assert_eq!(req.amount, Some(250));
            assert!(!req.idempotency_key.as_deref().unwrap_or_default().is_empty());
            assert!(req.metadata.contains_key("request_id"));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn refund_requires_payment_id() {
    let processor = RecordingProcessor::new();
    let req = post(REFUNDS, Some("merch_1"), json!({"amount": 5}));
    let reply = send(app(processor.clone()), req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "invalid_request");
    assert_eq!(reply.body["message"], "Invalid refund request");
    assert!(processor.calls().is_empty());
}

#[tokio::test]
async fn unknown_payment_is_404() {
    let err = ProcessorError::NotFound("payment pay_x not found".into());
    let processor = RecordingProcessor::failing(err);
    let body = json!({"payment_id": "pay_x"});
    let reply = send(app(processor), post(REFUNDS, Some("merch_1"), body)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error_code(), "not_found");
    assert_eq!(reply.body["message"], "Payment not found");
}

#[tokio::test]
async fn refund_failure_is_processing_error() {
    let processor = RecordingProcessor::failing(ProcessorError::Other("acquirer offline".into()));
    let body = json!({"payment_id": "pay_1"});
    let reply = send(app(processor), post(REFUNDS, Some("merch_1"), body)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), "processing_error");
    assert_eq!(reply.body["message"], "Refund processing failed");
}

#[tokio::test]
async fn refund_flow_against_in_memory_processor() {
    let router = app(Arc::new(InMemoryProcessor::new()));

    let body = json!({"amount": 1000, "currency": "USD"});
    let created = send(router.clone(), post("/v2/payments", Some("merch_1"), body)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let payment_id = created.body["id"].as_str().unwrap().to_string();

    let body = json!({"payment_id": payment_id, "amount": 400, "idempotency_key": "r-1"});
    let partial = send(router.clone(), post(REFUNDS, Some("merch_1"), body.clone())).await;
    assert_eq!(partial.status, StatusCode::CREATED);
    assert_eq!(partial.body["amount"], 400);

    let replay = send(router.clone(), post(REFUNDS, Some("merch_1"), body)).await;
    assert_eq!(replay.status, StatusCode::CREATED);
    assert_eq!(replay.body["id"], partial.body["id"]);

    let body = json!({"payment_id": payment_id, "amount": 700});
    let too_much = send(router.clone(), post(REFUNDS, Some("merch_1"), body)).await;
    assert_eq!(too_much.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(too_much.error_code(), "validation_error");

    let uri = format!("/v2/payments/{payment_id}");
    let fetched = send(router.clone(), get(&uri, Some("merch_1"))).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["amount_refunded"], 400);
    assert_eq!(fetched.body["status"], "partially_refunded");

    let body = json!({"payment_id": payment_id});
    let foreign = send(router, post(REFUNDS, Some("merch_2"), body)).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}
