use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE, USER_AGENT},
    HeaderName, HeaderValue, Method,
};
use axum::{middleware, routing::{get, post}, Router};
use common_security::{attach_merchant_context, MerchantHeader};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::GatewayConfig;
use crate::context::REQUEST_ID_HEADER;
use crate::metrics::{http_error_metrics, render};
use crate::orchestrator::PaymentOrchestrator;
use crate::payment_handlers::{
    create_marketplace_payment, create_payment, create_refund, get_payment, list_payments,
};
use crate::processor::PaymentProcessor;

pub async fn health() -> &'static str { "ok" }

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: PaymentOrchestrator,
    pub config: Arc<GatewayConfig>,
    merchant_header: MerchantHeader,
}

impl AppState {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        config: GatewayConfig,
    ) -> anyhow::Result<Self> {
        let header = HeaderName::try_from(config.merchant_header.as_str())
            .with_context(|| format!("invalid merchant header name {}", config.merchant_header))?;
        Ok(Self {
            orchestrator: PaymentOrchestrator::new(processor, config.processor_timeout),
            config: Arc::new(config),
            merchant_header: MerchantHeader(header),
        })
    }
}

fn cors_layer(config: &GatewayConfig, merchant_header: &MerchantHeader) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config
                .cors_allowed_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            USER_AGENT,
            merchant_header.0.clone(),
            HeaderName::from_static("idempotency-key"),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static("x-error-code")])
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment).get(list_payments))
        .route("/payments/:payment_id", get(get_payment))
        .route("/refunds", post(create_refund))
        .route("/marketplace/payments", post(create_marketplace_payment))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config, &state.merchant_header);

    let base = state.config.api_base_path.as_str();
    let router = if base.is_empty() || base == "/" {
        Router::new().merge(api_routes())
    } else {
        Router::new().nest(base, api_routes())
    };

    router
        .layer(middleware::from_fn_with_state(
            state.merchant_header.clone(),
            attach_merchant_context,
        ))
        .route("/healthz", get(health))
        .route("/metrics", get(render))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(http_error_metrics))
                .layer(cors),
        )
}
