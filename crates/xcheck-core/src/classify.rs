use serde_json::Value;

use crate::envelope::{ApiResult, Envelope, ErrorBody};
use crate::error::ApiError;

/// Retry hint used for a 429 whose body carries none.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Map a decoded response to an error, or `None` when it is a success.
///
/// The status code is checked first; a non-200 body is never read for a
/// `success` flag.
pub fn classify(status: u16, payload: &Value) -> Option<ApiError> {
    interpret_payload(status, payload).err()
}

/// Classify and, on success, unwrap the envelope's `result`.
pub fn interpret(api: ApiResult) -> Result<Value, ApiError> {
    interpret_payload(api.http_status, &api.payload)
}

fn interpret_payload(status: u16, payload: &Value) -> Result<Value, ApiError> {
    if status != 200 {
        return Err(classify_status(status, payload));
    }
    match Envelope::from_payload(payload) {
        Envelope::Success { result } => Ok(result),
        Envelope::Failure { error } => Err(ApiError::Application {
            code: error.code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
        }),
    }
}

fn classify_status(status: u16, payload: &Value) -> ApiError {
    let body = ErrorBody::from_payload(payload);
    let retry_after_seconds = (status == 429)
        .then(|| body.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS));
    let message = match status {
        400 => "Bad Request: the request format is invalid".to_string(),
        401 => "Unauthorized: the API key is invalid or authentication is required".to_string(),
        404 => "Not Found: the target could not be found".to_string(),
        429 => format!(
            "Rate Limited: retry after {} seconds",
            retry_after_seconds.unwrap_or(DEFAULT_RETRY_AFTER_SECS)
        ),
        500 => "Internal Server Error: the server encountered an error".to_string(),
        other => format!("HTTP error {other}"),
    };
    ApiError::HttpStatus {
        status,
        message,
        code: body.code,
        retry_after_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn well_known_statuses_get_fixed_messages() {
        let cases = [
            (400, "Bad Request"),
            (401, "Unauthorized"),
            (404, "Not Found"),
            (429, "Rate Limited"),
            (500, "Internal Server Error"),
        ];
        for (status, prefix) in cases {
            let err = classify(status, &json!({})).expect("non-200 must classify");
            assert_eq!(err.kind(), ErrorKind::HttpStatus);
            assert_eq!(err.status(), Some(status));
            assert!(
                err.message().starts_with(prefix),
                "{status}: {}",
                err.message()
            );
        }
    }

    #[test]
    fn other_statuses_get_generic_message() {
        let err = classify(503, &Value::Null).unwrap();
        assert_eq!(err.message(), "HTTP error 503");
        assert_eq!(err.retry_after_seconds(), None);
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = classify(429, &json!({ "error": { "retry_after": 45 } })).unwrap();
        assert_eq!(err.retry_after_seconds(), Some(45));
        assert_eq!(err.message(), "Rate Limited: retry after 45 seconds");
    }

    #[test]
    fn rate_limit_defaults_to_sixty_seconds() {
        for payload in [
            json!({}),
            json!({ "error": {} }),
            json!({ "error": { "retry_after": "later" } }),
            json!({ "error": { "retry_after": null } }),
        ] {
            let err = classify(429, &payload).unwrap();
            assert_eq!(err.retry_after_seconds(), Some(60), "payload: {payload}");
        }
    }

    #[test]
    fn non_200_ignores_success_flag() {
        let err = classify(
            500,
            &json!({ "success": true, "result": { "is_following": true } }),
        )
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
    }

    #[test]
    fn non_200_keeps_remote_code() {
        let err = classify(
            401,
            &json!({ "success": false, "error": { "code": "LOGIN_REQUIRED", "retry_after": 300 } }),
        )
        .unwrap();
        assert_eq!(err.code(), Some("LOGIN_REQUIRED"));
        assert_eq!(err.retry_after_seconds(), None);
    }

    #[test]
    fn application_error_uses_envelope_code_and_message() {
        let err = classify(
            200,
            &json!({ "success": false, "error": { "code": "ELEMENT_NOT_FOUND", "message": "no button" } }),
        )
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.message(), "API Error [ELEMENT_NOT_FOUND]: no button");
    }

    #[test]
    fn application_error_defaults() {
        let err = classify(200, &json!({ "success": false })).unwrap();
        assert_eq!(err.message(), "API Error [UNKNOWN]: Unknown error");
        let err = classify(200, &json!({})).unwrap();
        assert_eq!(err.message(), "API Error [UNKNOWN]: Unknown error");
    }

    #[test]
    fn success_is_not_an_error() {
        assert!(classify(200, &json!({ "success": true, "result": {} })).is_none());
    }

    #[test]
    fn interpret_unwraps_result() {
        let result = interpret(ApiResult {
            http_status: 200,
            payload: json!({ "success": true, "result": { "status": "healthy" } }),
        })
        .unwrap();
        assert_eq!(result, json!({ "status": "healthy" }));
    }
}
