//! Role and ownership checks shared by the route guard and every page.
//!
//! Roles match by exact membership. Admin gets no implicit access: it must be
//! listed in a required set, or is checked explicitly by [`can_mutate`].

use crate::error::{ApiError, ApiResult};
use crate::models::{OwnerFlag, Role};

/// Whether `actual` satisfies `required`. An empty set admits any signed-in
/// identity; an absent identity is always denied.
pub fn can_access(required: &[Role], actual: Option<Role>) -> bool {
    match actual {
        None => false,
        Some(role) => required.is_empty() || required.contains(&role),
    }
}

pub fn can_mutate(actual: Option<Role>, is_owner: bool) -> bool {
    actual == Some(Role::Admin) || is_owner
}

/// Ownership of one resource instance, as seen by the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ownership {
    #[default]
    Pending,
    Resolved(bool),
}

impl Ownership {
    /// Resolves an ownership lookup. Failures count as "not owner".
    pub fn from_check(check: ApiResult<OwnerFlag>) -> Self {
        match check {
            Ok(flag) => Ownership::Resolved(flag.is_owner),
            Err(error) => {
                tracing::debug!("Ownership check failed, denying mutation: {}", error);
                Ownership::Resolved(false)
            }
        }
    }
}

/// [`Ownership::from_check`], except that an expired session is passed back
/// to the caller so it can redirect to login.
pub fn resolve_ownership(check: ApiResult<OwnerFlag>) -> ApiResult<Ownership> {
    match check {
        Err(ApiError::TokenExpired) => Err(ApiError::TokenExpired),
        other => Ok(Ownership::from_check(other)),
    }
}

/// [`can_mutate`], but never before ownership has resolved.
pub fn mutation_allowed(actual: Option<Role>, ownership: Ownership) -> bool {
    match ownership {
        Ownership::Pending => false,
        Ownership::Resolved(is_owner) => can_mutate(actual, is_owner),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Edit,
    Delete,
    /// Create an album under an artist, or add a song to an album.
    CreateChild,
}

/// Actions a page may render for one resource instance.
pub fn permitted_actions(
    actual: Option<Role>,
    ownership: Ownership,
    with_child: bool,
) -> Vec<PageAction> {
    if !mutation_allowed(actual, ownership) {
        return Vec::new();
    }
    let mut actions = vec![PageAction::Edit, PageAction::Delete];
    if with_child {
        actions.push(PageAction::CreateChild);
    }
    actions
}
