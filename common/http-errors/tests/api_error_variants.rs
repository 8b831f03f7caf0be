use common_http_errors::{ApiError, ErrorBody};
use axum::response::IntoResponse;
use axum::body::to_bytes;
use axum::http::StatusCode;

#[test]
fn invalid_request_variant() {
    let err =
        ApiError::invalid_request("Invalid payment request", Some("missing field `amount`".into()));
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_request");
}

#[test]
fn unauthorized_variant() {
    let err = ApiError::Unauthorized { details: None };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "unauthorized");
}

#[test]
fn validation_variant() {
    let err = ApiError::Validation { details: Some("splits exceed total".into()) };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "validation_error");
}

#[test]
fn not_found_variant() {
    let err = ApiError::NotFound { message: "Payment not found".into(), details: None };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "not_found");
}

#[test]
fn internal_variant_keeps_custom_code() {
    let err = ApiError::Internal {
        code: "processing_error",
        message: "Payment processing failed".into(),
        details: Some("boom".into()),
    };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "processing_error");
}

#[tokio::test]
async fn body_carries_error_message_and_details() {
    let err = ApiError::NotFound {
        message: "Payment not found".into(),
        details: Some("payment pay_1 not found".into()),
    };
    let resp = err.into_response();
    let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "not_found");
    assert_eq!(body.message, "Payment not found");
    assert_eq!(body.details.as_deref(), Some("payment pay_1 not found"));
}

#[tokio::test]
async fn empty_details_are_omitted() {
    let err = ApiError::Unauthorized { details: Some(String::new()) };
    let bytes = to_bytes(err.into_response().into_body(), 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("details"), "unexpected details field: {}", text);
    assert!(text.contains("\"message\":\"Unauthorized request\""));
}
