// security/src/middleware.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use log::warn;
use serde_json::json;

use crate::ApiKeyPolicy;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY: &str = "api_key";

/// The caller's key from the `api_key` query parameter, an
/// `Authorization: Bearer` header or the `x-api-key` header, in that order.
pub fn extract_api_key(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let from_query = Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(mut params)| params.remove(API_KEY_QUERY));
    from_query
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|hv| hv.to_str().ok())
                .and_then(|auth| auth.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|hv| hv.to_str().ok())
                .map(|key| key.trim().to_string())
        })
}

/// Rejects unauthorized requests before the wrapped handler runs.
pub async fn require_api_key(State(policy): State<Arc<ApiKeyPolicy>>, request: Request, next: Next) -> Response {
    if policy.is_open() {
        return next.run(request).await;
    }
    let key = extract_api_key(request.uri(), request.headers());
    match policy.verify(key.as_deref()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
            let body = Json(json!({ "status": "error", "message": e.to_string() }));
            (StatusCode::UNAUTHORIZED, body).into_response()
        }
    }
}
