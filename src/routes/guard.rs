use std::sync::Arc;

use super::{Access, LOGIN_PATH, NEUTRAL_PATH, Route};
use crate::authz::can_access;
use crate::ports::navigator::Navigator;
use crate::session::{SessionSnapshot, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The session has not settled yet; render a placeholder.
    Loading,
    Admitted,
    Denied { redirect_to: &'static str },
}

/// Decides whether a page with `access` may render for `session`.
pub fn evaluate(session: &SessionSnapshot, access: Access) -> GuardState {
    let required = match access {
        Access::Public => return GuardState::Admitted,
        Access::Protected(required) => required,
    };
    if session.loading {
        return GuardState::Loading;
    }
    match session.role() {
        None => GuardState::Denied {
            redirect_to: LOGIN_PATH,
        },
        Some(role) if !can_access(required, Some(role)) => GuardState::Denied {
            redirect_to: NEUTRAL_PATH,
        },
        Some(_) => GuardState::Admitted,
    }
}

/// Consults the live session on every navigation; verdicts are never cached.
pub struct RouteGuard {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Evaluates `route` and, when denied, redirects before anything renders.
    pub fn check(&self, route: &Route) -> GuardState {
        let state = evaluate(&self.session.snapshot(), route.access());
        if let GuardState::Denied { redirect_to } = state {
            tracing::info!(route = %route, redirect_to, "Route denied");
            self.navigator.navigate(redirect_to);
        }
        state
    }
}
