//! Uniform response envelope
//!
//! Every endpoint wraps its payload in `{statusCode, message, data}` so
//! clients can distinguish success from failure without inspecting HTTP
//! status codes alone. Errors use the same shape with `data: null`.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// Success/error envelope returned by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    /// 200 OK with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    /// 201 Created with a payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl ApiResponse<serde_json::Value> {
    /// 200 OK with no payload (mutations that return nothing)
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::ok("fetched", serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["message"], "fetched");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_empty_envelope_has_null_data() {
        let body = ApiResponse::ok_empty("deleted");
        let value = serde_json::to_value(&body).unwrap();
        assert!(value["data"].is_null());
    }

    #[test]
    fn test_http_status_follows_envelope_status() {
        let response =
            ApiResponse::created("made", serde_json::json!({"id": 2})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ApiResponse::ok_empty("done").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
