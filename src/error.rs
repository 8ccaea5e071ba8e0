use crate::ports::transport::TransportError;

/// Detail value the backend uses to signal an expired session cookie.
pub const TOKEN_EXPIRED: &str = "Token Expired";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected client-side, before any request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Registration failed")]
    RegistrationFailed,
    #[error("Token Expired")]
    TokenExpired,
    #[error("{message}")]
    Resource { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_token_expired(&self) -> bool {
        matches!(self, ApiError::TokenExpired)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
