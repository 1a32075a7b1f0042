//! Fallback handler that turns any HTTP request into a router `Request`.

use crate::case::{camel_case_keys, rename_keys, Case};
use crate::error::AppError;
use crate::response::Envelope;
use crate::router::{Request, Verb};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Envelope {
    let request = match decode(&method, &uri, &headers, &body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(method = %method, uri = %uri, error = %e, "rejected request");
            return Envelope::from(e);
        }
    };
    match state.router.clone().dispatch_blocking(request).await {
        Envelope::Payload(value) => Envelope::Payload(camel_case_keys(value)),
        other => other,
    }
}

fn decode(method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Result<Request, AppError> {
    let verb: Verb = method.as_str().parse()?;
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let mut request = Request::new(verb, target);
    if matches!(verb, Verb::Post | Verb::Put) {
        require_json(headers)?;
        request.body = decode_body(body)?;
    }
    Ok(request)
}

fn require_json(headers: &HeaderMap) -> Result<(), AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if content_type.starts_with("application/json") {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "expected content-type application/json, got '{}'",
            content_type
        )))
    }
}

/// JSON object of scalars -> field name to raw string. Strings are taken unquoted.
pub fn decode_body(body: &[u8]) -> Result<HashMap<String, String>, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    let map = rename_keys(map, Case::Snake).map_err(|c| {
        AppError::BadRequest(format!("fields {} and {} both name {}", c.first, c.second, c.converted))
    })?;
    map.into_iter()
        .map(|(k, v)| {
            let raw = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::BadRequest(format!("field {} must be a string, number or boolean", k)))
                }
            };
            Ok((k, raw))
        })
        .collect()
}
