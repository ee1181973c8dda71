//! The uniform response envelope.
//!
//! Every endpoint, success or failure, answers with
//! `{success, data?, message?, error?, code?}`. Success bodies are built
//! here; error bodies are built by [`crate::errors::Error`]'s `IntoResponse`
//! so the two halves cannot drift apart.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// A data-free success, e.g. logout or delete confirmations.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": 42}));
    }

    #[test]
    fn test_message_included_when_set() {
        let body = serde_json::to_value(ApiResponse::ok_with_message("x", "created")).unwrap();
        assert_eq!(body["message"], "created");
    }
}
