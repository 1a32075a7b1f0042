//! Response envelope returned by handler methods and rendered by the transport.

use crate::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reply of a handler method: empty success, a JSON payload, or an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    Empty,
    Payload(serde_json::Value),
    Error { code: String, message: String },
}

impl Envelope {
    /// Success carrying `data` serialized as JSON.
    ///
    /// Goes through the text form so `f32` fields keep their shortest digits;
    /// `to_value` would widen them to the nearest `f64`.
    pub fn json<T: Serialize + ?Sized>(data: &T) -> Self {
        match serde_json::to_string(data).and_then(|text| serde_json::from_str(&text)) {
            Ok(value) => Envelope::Payload(value),
            Err(e) => Envelope::error("serialization_error", e.to_string()),
        }
    }

    pub fn ok() -> Self {
        Envelope::Empty
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Envelope::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Envelope::Error { .. })
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Envelope::Payload(v) => Some(v),
            _ => None,
        }
    }
}

impl From<AppError> for Envelope {
    fn from(err: AppError) -> Self {
        Envelope::error(err.code(), err.to_string())
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match self {
            Envelope::Empty => StatusCode::OK.into_response(),
            Envelope::Payload(value) => (StatusCode::OK, Json(value)).into_response(),
            Envelope::Error { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body(&code, message, None)),
            )
                .into_response(),
        }
    }
}

pub fn error_body(code: &str, message: String, details: Option<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_becomes_error_envelope() {
        let env = Envelope::from(AppError::NotFound("employee 4".into()));
        assert!(!env.is_success());
        assert_eq!(
            env,
            Envelope::Error {
                code: "not_found".into(),
                message: "not found: employee 4".into()
            }
        );
    }

    crate::record! {
        struct Reading in "readings" {
            #[id] id: Long,
            value: Float,
        }
    }

    #[test]
    fn float_fields_keep_their_digits_in_payloads() {
        let readings = vec![Reading { id: 1, value: 0.1 }];
        let env = Envelope::json(&readings);
        assert_eq!(env.payload().unwrap().to_string(), r#"[{"id":1,"value":0.1}]"#);
    }

    #[test]
    fn error_envelope_renders_as_500() {
        let resp = Envelope::error("bad_request", "nope").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Envelope::ok().into_response().status(), StatusCode::OK);
    }
}
