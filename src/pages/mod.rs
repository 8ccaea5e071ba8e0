pub mod albums;
pub mod artists;
pub mod auth;
pub mod home;
pub mod songs;

use std::fmt;
use std::sync::Arc;

use crate::api::auth::AuthClient;
use crate::api::{AlbumClient, ArtistClient, SongClient};
use crate::authz::{PageAction, mutation_allowed, resolve_ownership};
use crate::error::{ApiError, ApiResult};
use crate::models::{OwnerFlag, Role};
use crate::ports::navigator::Navigator;
use crate::ports::transport::Transport;
use crate::session::SessionStore;

/// What a page shows once its requests have settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Loading,
    Failed(String),
    Ready(PageView),
    /// The page moved the navigator; render the new location instead.
    Redirected,
}

/// Result of a page action such as a form submission or a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Navigated,
    Completed(String),
    /// Shown inline; nothing was changed.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub action: PageAction,
    pub label: String,
    /// Route or command that triggers the control.
    pub target: String,
}

impl Control {
    pub fn new(action: PageAction, label: &str, target: impl Into<String>) -> Self {
        Self {
            action,
            label: label.to_string(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub label: String,
    pub href: Option<String>,
    pub controls: Vec<Control>,
}

impl Item {
    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: Some(href.into()),
            controls: Vec::new(),
        }
    }

    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: None,
            controls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub items: Vec<Item>,
    /// Shown when `items` is empty.
    pub empty: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub title: String,
    pub details: Vec<String>,
    pub controls: Vec<Control>,
    pub sections: Vec<Section>,
}

impl PageView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    pub fn section(mut self, heading: &str, items: Vec<Item>, empty: &str) -> Self {
        self.sections.push(Section {
            heading: heading.to_string(),
            items,
            empty: empty.to_string(),
        });
        self
    }

    pub fn control_actions(&self) -> Vec<PageAction> {
        self.controls.iter().map(|control| control.action).collect()
    }
}

/// Everything a page needs: the session and one client per resource.
pub struct PageContext {
    pub session: Arc<SessionStore>,
    pub navigator: Arc<dyn Navigator>,
    pub auth: AuthClient,
    pub artists: ArtistClient,
    pub albums: AlbumClient,
    pub songs: SongClient,
}

impl PageContext {
    pub fn new(transport: Arc<dyn Transport>, navigator: Arc<dyn Navigator>) -> Self {
        let auth = AuthClient::new(transport.clone());
        Self {
            session: Arc::new(SessionStore::new(auth.clone(), navigator.clone())),
            navigator,
            auth,
            artists: ArtistClient::new(transport.clone()),
            albums: AlbumClient::new(transport.clone()),
            songs: SongClient::new(transport),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    /// Page state for a failed load. An expired session redirects to login
    /// instead of showing `message`.
    pub fn load_failed(&self, error: ApiError, message: &str) -> PageState {
        if error.is_token_expired() {
            self.session.expire();
            return PageState::Redirected;
        }
        tracing::warn!("{}: {}", message, error);
        PageState::Failed(message.to_string())
    }

    /// Outcome for a failed action, with the same expiry handling.
    pub fn action_failed(&self, error: ApiError, message: &str) -> Outcome {
        if error.is_token_expired() {
            self.session.expire();
            return Outcome::Navigated;
        }
        tracing::warn!("{}: {}", message, error);
        Outcome::Rejected(message.to_string())
    }

    /// Decides whether an action on one resource may proceed, given its
    /// ownership check. An expired session redirects to login; any other
    /// failed check denies with `denied`.
    pub fn gate(&self, check: ApiResult<OwnerFlag>, denied: &str) -> Result<(), Outcome> {
        match resolve_ownership(check) {
            Ok(ownership) if mutation_allowed(self.role(), ownership) => Ok(()),
            Ok(_) => Err(Outcome::Rejected(denied.to_string())),
            Err(error) => Err(self.action_failed(error, denied)),
        }
    }

    pub fn go(&self, to: &str) -> Outcome {
        self.navigator.navigate(to);
        Outcome::Navigated
    }
}

/// Rejects blank required text before any request is sent.
pub(crate) fn require(value: &str, message: &str) -> Result<(), Outcome> {
    if value.trim().is_empty() {
        Err(Outcome::Rejected(message.to_string()))
    } else {
        Ok(())
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        for line in &self.details {
            writeln!(f, "{}", line)?;
        }
        if !self.controls.is_empty() {
            writeln!(f)?;
            for control in &self.controls {
                writeln!(f, "[{}] {}", control.label, control.target)?;
            }
        }
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}", section.heading)?;
            if section.items.is_empty() {
                writeln!(f, "  {}", section.empty)?;
            }
            for item in &section.items {
                match &item.href {
                    Some(href) => write!(f, "  - {} ({})", item.label, href)?,
                    None => write!(f, "  - {}", item.label)?,
                }
                for control in &item.controls {
                    write!(f, " [{}: {}]", control.label, control.target)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageState::Loading => writeln!(f, "Loading..."),
            PageState::Failed(message) => writeln!(f, "Error: {}", message),
            PageState::Ready(view) => write!(f, "{}", view),
            PageState::Redirected => writeln!(f, "Redirecting..."),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Navigated => Ok(()),
            Outcome::Completed(message) => writeln!(f, "{}", message),
            Outcome::Rejected(message) => writeln!(f, "Error: {}", message),
        }
    }
}
