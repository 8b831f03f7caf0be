//! Request-scoped facts gathered from the transport before an orchestrator runs.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use common_security::{MerchantContext, MerchantId};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::idempotency::{HeaderKey, IDEMPOTENCY_HEADER};
use crate::models::MutatingRequest;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const META_REQUEST_ID: &str = "request_id";
pub const META_IP_ADDRESS: &str = "ip_address";
pub const META_USER_AGENT: &str = "user_agent";

const CORE_METADATA_KEYS: [&str; 3] = [META_REQUEST_ID, META_IP_ADDRESS, META_USER_AGENT];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub request_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Forwarded headers win over the socket peer, first hop only.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

impl RequestMetadata {
    pub fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self {
            request_id: header_str(&parts.headers, REQUEST_ID_HEADER)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ip_address: client_ip(&parts.headers, peer),
            user_agent: header_str(&parts.headers, "user-agent").map(str::to_string),
        }
    }
}

/// Everything an orchestrator needs from the request besides its body.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub merchant: Option<MerchantContext>,
    pub metadata: RequestMetadata,
    pub idempotency_header: HeaderKey,
}

#[async_trait]
impl<S> FromRequestParts<S> for InboundRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let merchant = MerchantContext::from_request_parts(parts, state).await.ok();
        Ok(Self {
            merchant,
            metadata: RequestMetadata::from_parts(parts),
            idempotency_header: HeaderKey::from_header(parts.headers.get(IDEMPOTENCY_HEADER)),
        })
    }
}

pub fn resolve_merchant(merchant: Option<&MerchantContext>) -> Result<MerchantId, GatewayError> {
    merchant
        .map(|ctx| ctx.merchant_id.clone())
        .ok_or(GatewayError::MissingMerchantContext)
}

/// Returns a copy of `req` whose metadata carries the request-scoped core keys. Client values
/// under those keys are discarded even when the gateway has nothing to put in their place.
pub fn enrich<R: MutatingRequest>(req: R, meta: &RequestMetadata) -> R {
    let mut metadata = req.metadata().clone();
    for key in CORE_METADATA_KEYS {
        metadata.remove(key);
    }
    metadata.insert(META_REQUEST_ID.to_string(), meta.request_id.clone());
    if let Some(ip) = &meta.ip_address {
        metadata.insert(META_IP_ADDRESS.to_string(), ip.clone());
    }
    if let Some(agent) = &meta.user_agent {
        metadata.insert(META_USER_AGENT.to_string(), agent.clone());
    }
    req.with_metadata(metadata)
}
