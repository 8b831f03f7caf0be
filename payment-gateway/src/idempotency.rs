//! Assigns the deduplication key carried by every mutating call.
//!
//! A client key (body field or `Idempotency-Key` header) is forwarded byte-for-byte. When the
//! client sent none, a fresh UUID v4 is generated. Deduplication itself belongs to the processor.

use axum::http::HeaderValue;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::models::MutatingRequest;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

fn supplied(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.trim().is_empty())
}

/// The `Idempotency-Key` header as received. Values are decoded from the raw header bytes so
/// non-ASCII keys survive; bytes that are not UTF-8 cannot be forwarded and are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeaderKey {
    #[default]
    Absent,
    Present(String),
    Undecodable,
}

impl HeaderKey {
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        match value.map(|v| std::str::from_utf8(v.as_bytes())) {
            None => HeaderKey::Absent,
            Some(Ok(key)) => HeaderKey::Present(key.to_string()),
            Some(Err(_)) => HeaderKey::Undecodable,
        }
    }

    pub fn key(&self) -> Result<Option<&str>, GatewayError> {
        match self {
            HeaderKey::Absent => Ok(None),
            HeaderKey::Present(key) => Ok(Some(key)),
            HeaderKey::Undecodable => Err(GatewayError::MalformedRequest(format!(
                "{IDEMPOTENCY_HEADER} header is not valid UTF-8"
            ))),
        }
    }
}

pub fn generate_key() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the request carrying exactly one key, plus whether that key was generated here.
pub fn resolve<R: MutatingRequest>(
    req: R,
    header_key: Option<&str>,
) -> Result<(R, bool), GatewayError> {
    let body_key = supplied(req.idempotency_key()).map(str::to_string);
    match (body_key, supplied(header_key)) {
        (Some(body), Some(header)) if body != header => Err(GatewayError::MalformedRequest(format!(
            "idempotency key in body does not match {IDEMPOTENCY_HEADER} header"
        ))),
        (Some(body), _) => Ok((req.with_idempotency_key(body), false)),
        (None, Some(header)) => Ok((req.with_idempotency_key(header.to_string()), false)),
        (None, None) => Ok((req.with_idempotency_key(generate_key()), true)),
    }
}
