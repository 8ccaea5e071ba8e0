use crate::models::{Role, User};
use crate::ports::transport::{ApiResponse, FormField, RequestBody};

pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

pub fn empty_response(status: u16) -> ApiResponse {
    ApiResponse::new(status, Vec::new())
}

pub fn user_with_role(role: Role) -> User {
    User {
        id: 1,
        name: format!("Test {}", role),
        email: format!("{}@example.com", role),
        role,
    }
}

pub fn user_json(role: Role) -> serde_json::Value {
    serde_json::to_value(user_with_role(role)).unwrap()
}

/// Names of the submitted fields, in order.
pub fn field_names(body: &RequestBody) -> Vec<String> {
    match body {
        RequestBody::Empty => Vec::new(),
        RequestBody::Json(value) => value
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default(),
        RequestBody::Multipart(fields) => fields.iter().map(|f| f.name().to_string()).collect(),
    }
}

pub fn form_text(body: &RequestBody, name: &str) -> Option<String> {
    match body {
        RequestBody::Multipart(fields) => fields.iter().find_map(|field| match field {
            FormField::Text { name: n, value } if n == name => Some(value.clone()),
            _ => None,
        }),
        RequestBody::Json(value) => value.get(name).and_then(|v| v.as_str()).map(String::from),
        RequestBody::Empty => None,
    }
}
