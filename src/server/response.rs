//! The one response envelope every JSON endpoint uses.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(super) struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct FailureBody {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub error_code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

pub(super) fn success<T: Serialize>(data: T, message: Option<&str>) -> Json<SuccessBody<T>> {
    Json(SuccessBody {
        success: true,
        data,
        message: message.map(String::from),
    })
}

pub(super) fn failure(
    error_code: &'static str,
    message: impl Into<String>,
    details: Vec<String>,
) -> FailureBody {
    FailureBody {
        success: false,
        error_code,
        message: message.into(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_absent_message() {
        let body = serde_json::to_value(&success(42, None).0).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn failure_camel_cases_error_code() {
        let body =
            serde_json::to_value(failure("INVALID_DATE", "bad date", Vec::new())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "errorCode": "INVALID_DATE",
                "message": "bad date",
            })
        );
    }

    #[test]
    fn failure_includes_details_when_present() {
        let body = serde_json::to_value(failure(
            "INVALID_FILE",
            "file validation failed",
            vec!["too big".into()],
        ))
        .unwrap();
        assert_eq!(body["details"], serde_json::json!(["too big"]));
    }
}
