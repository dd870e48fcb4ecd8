//! Response envelope decoding.
//!
//! Every API response is `{success, result?, error?: {code, message,
//! retry_after?}}`. Bodies are decoded once here into [`ApiResult`]; the
//! envelope is then read into [`Envelope`] so the rest of the crate never
//! pokes at raw JSON paths.

use serde_json::Value;

use crate::error::ApiError;
use crate::transport::TransportResponse;

/// A decoded response: HTTP status plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    pub http_status: u16,
    pub payload: Value,
}

impl ApiResult {
    pub fn decode(response: TransportResponse) -> Result<Self, ApiError> {
        let payload = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self {
            http_status: response.status,
            payload,
        })
    }
}

/// The `error` object of an envelope, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn from_payload(payload: &Value) -> Self {
        let Some(error) = payload.get("error") else {
            return Self::default();
        };
        Self {
            code: error.get("code").and_then(Value::as_str).map(str::to_string),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            retry_after: error.get("retry_after").and_then(parse_seconds),
        }
    }
}

/// Accepts a non-negative number or a string holding one.
fn parse_seconds(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success { result: Value },
    Failure { error: ErrorBody },
}

impl Envelope {
    /// Only a literal `success: true` counts as success.
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("success") {
            Some(Value::Bool(true)) => Envelope::Success {
                result: payload.get("result").cloned().unwrap_or(Value::Null),
            },
            _ => Envelope::Failure {
                error: ErrorBody::from_payload(payload),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_rejects_non_json_body() {
        let err = ApiResult::decode(TransportResponse {
            status: 502,
            body: b"<html>bad gateway</html>".to_vec(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn decode_rejects_empty_body() {
        let err = ApiResult::decode(TransportResponse {
            status: 200,
            body: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn success_envelope_exposes_result() {
        let env = Envelope::from_payload(&json!({
            "success": true,
            "action": "like",
            "result": { "is_liked": false, "like_count": 3 }
        }));
        assert_eq!(
            env,
            Envelope::Success {
                result: json!({ "is_liked": false, "like_count": 3 })
            }
        );
    }

    #[test]
    fn success_without_result_yields_null() {
        let env = Envelope::from_payload(&json!({ "success": true }));
        assert_eq!(env, Envelope::Success { result: Value::Null });
    }

    #[test]
    fn truthy_non_bool_success_is_failure() {
        let env = Envelope::from_payload(&json!({ "success": 1 }));
        assert!(matches!(env, Envelope::Failure { .. }));
    }

    #[test]
    fn error_body_reads_numeric_and_string_retry_after() {
        let body = ErrorBody::from_payload(&json!({ "error": { "retry_after": 45 } }));
        assert_eq!(body.retry_after, Some(45));
        let body = ErrorBody::from_payload(&json!({ "error": { "retry_after": "120" } }));
        assert_eq!(body.retry_after, Some(120));
        let body = ErrorBody::from_payload(&json!({ "error": { "retry_after": "soon" } }));
        assert_eq!(body.retry_after, None);
        let body = ErrorBody::from_payload(&json!({ "error": { "retry_after": -5 } }));
        assert_eq!(body.retry_after, None);
    }

    #[test]
    fn error_body_tolerates_missing_error_object() {
        let body = ErrorBody::from_payload(&json!({ "success": false }));
        assert_eq!(body, ErrorBody::default());
        let body = ErrorBody::from_payload(&json!([1, 2, 3]));
        assert_eq!(body, ErrorBody::default());
    }
}
