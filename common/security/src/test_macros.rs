//! Shared test helper macro for attaching merchant identity headers.
//! Usage: test_merchant_headers!(req, merchant="merch_1", request_id="req-1");
#[macro_export]
macro_rules! test_merchant_headers {
    ($req:expr, merchant=$merchant:expr, request_id=$request_id:expr) => {{
        let h = $req.headers_mut();
        h.insert("X-Merchant-ID", ::axum::http::HeaderValue::from_str($merchant).unwrap());
        h.insert("X-Request-ID", ::axum::http::HeaderValue::from_str($request_id).unwrap());
    }};
    ($req:expr, merchant=$merchant:expr) => {{
        let h = $req.headers_mut();
        h.insert("X-Merchant-ID", ::axum::http::HeaderValue::from_str($merchant).unwrap());
    }};
}
