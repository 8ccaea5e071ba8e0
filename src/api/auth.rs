use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{decode, execute};
use crate::error::{ApiError, ApiResult, TOKEN_EXPIRED};
use crate::models::User;
use crate::ports::transport::{ApiRequest, RequestBody, Transport};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Account endpoints: login, registration, logout and the current identity.
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn Transport>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Exchanges credentials for a session cookie.
    ///
    /// Every rejection is reported as `InvalidCredentials`; the cause is not
    /// distinguished.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Please enter both email and password.".to_string(),
            ));
        }
        let request = ApiRequest::post("login").body(RequestBody::Json(json!({
            "email": email,
            "password": password,
        })));
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            tracing::info!(status = response.status, "Login rejected");
            return Err(ApiError::InvalidCredentials);
        }
        Ok(())
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation("All fields are required.".to_string()));
        }
        let request = ApiRequest::post("register").body(RequestBody::Json(json!({
            "name": name,
            "email": email,
            "password": password,
        })));
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            tracing::info!(status = response.status, "Registration rejected");
            return Err(ApiError::RegistrationFailed);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> ApiResult<()> {
        execute(&*self.transport, ApiRequest::post("logout"), "Logout failed").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self) -> ApiResult<User> {
        let response = execute(
            &*self.transport,
            ApiRequest::get("user"),
            "Failed to fetch current user",
        )
        .await?;
        decode(&response)
    }

    /// Changes the signed-in account's password and returns the backend's
    /// confirmation message.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        repeat_password: &str,
    ) -> ApiResult<String> {
        if current_password.is_empty() || new_password.is_empty() || repeat_password.is_empty() {
            return Err(ApiError::Validation("All fields are required.".to_string()));
        }
        if new_password != repeat_password {
            return Err(ApiError::Validation(
                "New passwords do not match.".to_string(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "New password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            )));
        }

        let request = ApiRequest::post("change-password").body(RequestBody::Json(json!({
            "current_password": current_password,
            "new_password": new_password,
        })));
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            if response.detail().as_deref() == Some(TOKEN_EXPIRED) {
                return Err(ApiError::TokenExpired);
            }
            return Err(ApiError::Resource {
                status: response.status,
                message: response
                    .error_message()
                    .unwrap_or_else(|| "Failed to change password".to_string()),
            });
        }

        let body: MessageBody = decode(&response).unwrap_or(MessageBody { message: None });
        Ok(body
            .message
            .unwrap_or_else(|| "Password changed successfully.".to_string()))
    }
}
