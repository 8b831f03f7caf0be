use std::fmt;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{request::Parts, HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;
use common_http_errors::ApiError;

use crate::SecurityError;

const MAX_MERCHANT_ID_LEN: usize = 64;

/// Identifier of an authenticated merchant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    pub fn parse(raw: &str) -> Result<Self, SecurityError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(SecurityError::EmptyMerchantId);
        }
        let well_formed = value.len() <= MAX_MERCHANT_ID_LEN
            && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !well_formed {
            return Err(SecurityError::MalformedMerchantId(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Authenticated identity attached to a request by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantContext {
    pub merchant_id: MerchantId,
}

impl MerchantContext {
    pub fn new(merchant_id: MerchantId) -> Self { Self { merchant_id } }
}

#[async_trait]
impl<S> FromRequestParts<S> for MerchantContext where S: Send + Sync {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<MerchantContext>()
            .cloned()
            .ok_or(SecurityError::MissingMerchantContext)?;
        Ok(ctx)
    }
}

/// Name of the header the edge proxy uses to forward the verified merchant identity.
#[derive(Debug, Clone)]
pub struct MerchantHeader(pub HeaderName);

impl Default for MerchantHeader {
    fn default() -> Self { Self(HeaderName::from_static("x-merchant-id")) }
}

fn merchant_from_headers(headers: &HeaderMap, name: &HeaderName) -> Option<MerchantId> {
    let raw = headers.get(name)?.to_str().ok()?;
    match MerchantId::parse(raw) {
        Ok(id) => Some(id),
        Err(err) => {
            debug!(error = %err, "ignoring unusable merchant header");
            None
        }
    }
}

/// Middleware standing in for the authentication collaborator: trusts the identity header set
/// by the edge proxy and stores it as a `MerchantContext` request extension. Requests without a
/// usable header pass through untouched and are rejected by the handlers.
pub async fn attach_merchant_context(
    State(header): State<MerchantHeader>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().remove::<MerchantContext>();
    if let Some(merchant_id) = merchant_from_headers(req.headers(), &header.0) {
        req.extensions_mut().insert(MerchantContext::new(merchant_id));
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_trims_and_accepts_simple_ids() {
        let id = MerchantId::parse("  merch_123-A ").expect("valid id");
        assert_eq!(id.as_str(), "merch_123-A");
    }

    #[test]
    fn parse_rejects_empty_and_odd_characters() {
        assert_eq!(MerchantId::parse("   "), Err(SecurityError::EmptyMerchantId));
        assert!(matches!(MerchantId::parse("merch 1"), Err(SecurityError::MalformedMerchantId(_))));
        let too_long = MerchantId::parse(&"m".repeat(65));
        assert!(matches!(too_long, Err(SecurityError::MalformedMerchantId(_))));
    }

    #[test]
    fn header_lookup_uses_configured_name() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Merchant-ID", HeaderValue::from_static("merch_1"));
        let name = MerchantHeader::default().0;
        assert_eq!(merchant_from_headers(&headers, &name).unwrap().as_str(), "merch_1");
        let other = HeaderName::from_static("x-account");
        assert!(merchant_from_headers(&headers, &other).is_none());
    }

    #[tokio::test]
    async fn extractor_rejects_when_context_absent() {
        let req = axum::http::Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = MerchantContext::from_request_parts(&mut parts, &())
            .await
            .expect_err("should reject");
        assert_eq!(err, ApiError::Unauthorized { details: None });
    }

    #[tokio::test]
    async fn extractor_returns_attached_context() {
        let mut req = axum::http::Request::builder().uri("/").body(()).unwrap();
        let ctx = MerchantContext::new(MerchantId::parse("merch_9").unwrap());
        req.extensions_mut().insert(ctx.clone());
        let (mut parts, _) = req.into_parts();
        let got = MerchantContext::from_request_parts(&mut parts, &()).await.expect("context");
        assert_eq!(got, ctx);
    }
}
