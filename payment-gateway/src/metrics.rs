use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use common_http_errors::ERROR_CODE_HEADER;

pub const SERVICE_NAME: &str = "payment-gateway";

pub static GATEWAY_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    )
    .expect("valid http_errors_total definition");
    GATEWAY_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

pub static PROCESSOR_CALLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("processor_calls_total", "Payment processor invocations by outcome"),
        &["operation", "outcome"],
    )
    .expect("valid processor_calls_total definition");
    GATEWAY_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

pub static PROCESSOR_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    let v = HistogramVec::new(
        HistogramOpts::new("processor_call_duration_seconds", "Latency of payment processor calls"),
        &["operation"],
    )
    .expect("valid processor_call_duration_seconds definition");
    GATEWAY_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

pub async fn http_error_metrics(req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get(ERROR_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        HTTP_ERRORS_TOTAL.with_label_values(&[SERVICE_NAME, code, status.as_str()]).inc();
    }
    resp
}

pub async fn render() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = GATEWAY_REGISTRY.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8_lossy(&buf).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn processor_counters_show_up_in_exposition() {
        PROCESSOR_CALLS_TOTAL.with_label_values(&["create_payment", "ok"]).inc();
        let (status, text) = render().await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("processor_calls_total"));
    }
}
