use std::sync::{Arc, PoisonError, RwLock};

use tracing::instrument;

use crate::api::auth::AuthClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Role, User};
use crate::ports::navigator::Navigator;
use crate::routes::LOGIN_PATH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<User>,
    /// True until the first `refresh()` settles.
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|user| user.role)
    }
}

/// Holds the signed-in identity for the lifetime of the app.
///
/// Created once, shared as `Arc<SessionStore>` with the route guard and the
/// pages. Consumers must not read the identity as authoritative while
/// `loading` is true.
pub struct SessionStore {
    auth: AuthClient,
    navigator: Arc<dyn Navigator>,
    state: RwLock<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(auth: AuthClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            auth,
            navigator,
            state: RwLock::new(SessionSnapshot {
                identity: None,
                loading: true,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<User> {
        self.snapshot().identity
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot().role()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().loading
    }

    fn settle(&self, identity: Option<User>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.identity = identity;
        state.loading = false;
    }

    /// Re-reads the current identity from the backend.
    ///
    /// Any failure clears the identity. An expired token also sends the
    /// navigator to the login page.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        match self.auth.current_user().await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, role = %user.role, "Session refreshed");
                self.settle(Some(user));
            }
            Err(ApiError::TokenExpired) => {
                tracing::info!("Session expired, redirecting to login");
                self.expire();
            }
            Err(error) => {
                tracing::debug!("No active session: {}", error);
                self.settle(None);
            }
        }
    }

    /// Invalidates the session. The local identity is cleared whatever the
    /// backend answers.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        match self.auth.logout().await {
            Ok(()) => tracing::info!("Logged out"),
            Err(ApiError::TokenExpired) => tracing::debug!("Session already expired"),
            Err(error) => tracing::warn!("Logout request failed: {}", error),
        }
        self.settle(None);
    }

    /// Signs in and loads the resulting identity.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        self.auth.login(email, password).await?;
        self.refresh().await;
        self.identity().ok_or(ApiError::InvalidCredentials)
    }

    /// Handles an expired session seen anywhere in the app.
    pub fn expire(&self) {
        self.settle(None);
        self.navigator.navigate(LOGIN_PATH);
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use serde_json::json;

    use super::*;
    use crate::navigation::History;
    use crate::ports::transport::{MockTransport, TransportError};
    use crate::test_utils::{empty_response, json_response, user_json};

    fn store(transport: MockTransport) -> (SessionStore, Arc<History>) {
        let history = Arc::new(History::new("/"));
        let store = SessionStore::new(AuthClient::new(Arc::new(transport)), history.clone());
        (store, history)
    }

    #[test]
    fn test_initial_state() {
        let (store, _) = store(MockTransport::new());
        let snapshot = store.snapshot();
        assert!(snapshot.loading);
        assert!(snapshot.identity.is_none());
    }

    #[tokio::test]
    async fn test_refresh_stores_identity() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .times(2)
            .returning(|_| Ok(json_response(200, user_json(Role::Publisher))));
        let (store, history) = store(transport);

        store.refresh().await;
        store.refresh().await;

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.role(), Some(Role::Publisher));
        assert_eq!(history.current(), "/");
    }

    #[tokio::test]
    async fn test_refresh_token_expired_redirects_to_login() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(json_response(403, json!({"detail": "Token Expired"}))));
        let (store, history) = store(transport);

        store.refresh().await;

        assert!(store.identity().is_none());
        assert!(!store.is_loading());
        assert_eq!(history.current(), "/login");
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_without_redirect() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(TransportError::Send("connection refused".to_string())));
        let (store, history) = store(transport);

        store.refresh().await;

        assert!(store.identity().is_none());
        assert!(!store.is_loading());
        assert_eq!(history.entries(), vec!["/"]);
    }

    #[tokio::test]
    async fn test_logout_twice_leaves_identity_absent() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json_response(200, user_json(Role::User))));
        transport
            .expect_send()
            .withf(|req| req.path == "logout")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json_response(200, json!({"message": "success"}))));
        transport
            .expect_send()
            .withf(|req| req.path == "logout")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json_response(403, json!({"detail": "Token Expired"}))));
        let (store, history) = store(transport);

        store.refresh().await;
        assert!(store.identity().is_some());

        store.logout().await;
        assert!(store.identity().is_none());
        store.logout().await;
        assert!(store.identity().is_none());
        assert_eq!(history.current(), "/");
    }

    #[tokio::test]
    async fn test_logout_clears_on_server_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(empty_response(500)));
        let (store, _) = store(transport);

        store.logout().await;
        assert!(store.identity().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_login_loads_identity() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "login")
            .returning(|_| Ok(json_response(200, json!({"jwt": "token"}))));
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .returning(|_| Ok(json_response(200, user_json(Role::Admin))));
        let (store, _) = store(transport);

        let user = store.login("admin@example.com", "secret").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(store.role(), Some(Role::Admin));
    }
}
