use std::time::Duration;

use serde::Deserialize;

use crate::models::Attachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// One field of a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, attachment: Attachment },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// A request against the catalog backend. `path` is relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    error: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error_body(&self) -> Option<ErrorBody> {
        serde_json::from_slice(&self.body).ok()
    }

    /// The `detail` field of a JSON error body, if any.
    pub fn detail(&self) -> Option<String> {
        self.error_body().and_then(|body| body.detail)
    }

    /// The `error` field of a JSON error body, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error_body().and_then(|body| body.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid request url: {0}")]
    InvalidUrl(String),
    #[error("Failed to send http request: {0}")]
    Send(String),
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Port trait for talking to the catalog backend.
///
/// Every request carries the session cookie implicitly. Implementations live in
/// `services::http` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_sentinel() {
        let response = ApiResponse::new(403, r#"{"detail": "Token Expired"}"#);
        assert!(!response.is_success());
        assert_eq!(response.detail().as_deref(), Some("Token Expired"));
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_non_json_error_body() {
        let response = ApiResponse::new(502, "<html>Bad Gateway</html>");
        assert!(response.detail().is_none());
    }

    #[test]
    fn test_query_builder() {
        let request = ApiRequest::delete("artists/delete/").query("id", 7);
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.query_value("id"), Some("7"));
        assert_eq!(request.body, RequestBody::Empty);
    }
}
