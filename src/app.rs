use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::pages::{self, PageContext, PageState};
use crate::ports::navigator::Navigator;
use crate::ports::transport::Transport;
use crate::routes::guard::{GuardState, RouteGuard};
use crate::routes::Route;

/// Redirect hops followed by one render before giving up.
const MAX_REDIRECTS: usize = 4;

/// A rendered page and the location it was rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub location: String,
    pub state: PageState,
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@ {}", self.location)?;
        write!(f, "{}", self.state)
    }
}

/// Routes locations to pages behind the route guard.
pub struct App {
    ctx: PageContext,
    guard: RouteGuard,
}

impl App {
    pub fn new(transport: Arc<dyn Transport>, navigator: Arc<dyn Navigator>) -> Self {
        let ctx = PageContext::new(transport, navigator.clone());
        let guard = RouteGuard::new(ctx.session.clone(), navigator);
        Self { ctx, guard }
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    /// Loads the identity behind the stored session, if any.
    pub async fn start(&self) {
        self.ctx.session.refresh().await;
    }

    /// Moves to `route` and reports whether the guard admits the session.
    /// A denial redirects, exactly as opening the route would.
    pub fn enter(&self, route: &Route) -> bool {
        self.ctx.navigator.navigate(&route.path());
        self.guard.check(route) == GuardState::Admitted
    }

    #[instrument(skip(self))]
    pub async fn open(&self, location: &str) -> Rendered {
        self.ctx.navigator.navigate(location);
        self.render_current().await
    }

    /// Renders the navigator's current location, following redirects.
    pub async fn render_current(&self) -> Rendered {
        for _ in 0..MAX_REDIRECTS {
            let location = self.ctx.navigator.current();
            let route = Route::parse(&location);
            match self.guard.check(&route) {
                GuardState::Loading => {
                    return Rendered {
                        location,
                        state: PageState::Loading,
                    };
                }
                GuardState::Denied { .. } => continue,
                GuardState::Admitted => {}
            }
            let state = self.render(&route).await;
            if state != PageState::Redirected {
                return Rendered { location, state };
            }
        }
        tracing::warn!("Too many redirects");
        Rendered {
            location: self.ctx.navigator.current(),
            state: PageState::Failed("Too many redirects".to_string()),
        }
    }

    async fn render(&self, route: &Route) -> PageState {
        let ctx = &self.ctx;
        match route {
            Route::Start => pages::home::start(ctx),
            Route::Login => pages::auth::login_form(),
            Route::Register => pages::auth::register_form(),
            Route::Home => pages::home::home(ctx),
            Route::Settings => pages::home::settings(ctx),
            Route::Admin => pages::home::admin(ctx).await,
            Route::Artists => pages::artists::list(ctx).await,
            Route::MyArtists => pages::artists::my_artists(ctx).await,
            Route::ArtistCreate => pages::artists::create_form(),
            Route::Artist(id) => pages::artists::detail(ctx, *id).await,
            Route::ArtistEdit(id) => pages::artists::edit_form(ctx, *id).await,
            Route::AlbumCreate(artist_id) => pages::albums::create_form(ctx, *artist_id).await,
            Route::Albums => pages::albums::list(ctx).await,
            Route::Album(id) => pages::albums::detail(ctx, *id).await,
            Route::AlbumEdit(id) => pages::albums::edit_form(ctx, *id).await,
            Route::SongCreate(album_id) => pages::songs::create_form(ctx, *album_id).await,
            Route::Songs => pages::songs::list(ctx).await,
            Route::SongEdit(id) => pages::songs::edit_form(ctx, *id).await,
            Route::NotFound(path) => pages::home::not_found(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::authz::PageAction;
    use crate::models::{Attachment, Genre, Role, SongDraft};
    use crate::navigation::History;
    use crate::pages::Outcome;
    use crate::ports::transport::{Method, MockTransport};
    use crate::test_utils::{empty_response, field_names, json_response, user_json};

    fn expect_user(transport: &mut MockTransport, role: Role) {
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .returning(move |_| Ok(json_response(200, user_json(role))));
    }

    fn expect_artist_7(transport: &mut MockTransport, is_owner: bool) {
        transport
            .expect_send()
            .withf(|req| req.path == "artists/get/" && req.query_value("id") == Some("7"))
            .returning(|_| Ok(json_response(200, json!({"id": 7, "name": "Nina Simone"}))));
        transport
            .expect_send()
            .withf(|req| req.path == "albums/list_by_artist/")
            .returning(|_| Ok(json_response(200, json!([]))));
        transport
            .expect_send()
            .withf(|req| req.path == "artists/is_owner/" && req.query_value("id") == Some("7"))
            .returning(move |_| Ok(json_response(200, json!({"is_owner": is_owner}))));
    }

    async fn started(transport: MockTransport) -> (App, Arc<History>) {
        let history = Arc::new(History::new("/"));
        let app = App::new(Arc::new(transport), history.clone());
        app.start().await;
        (app, history)
    }

    fn controls(rendered: &Rendered) -> Vec<PageAction> {
        match &rendered.state {
            PageState::Ready(view) => view.control_actions(),
            other => panic!("expected a ready page, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_sees_no_controls_on_foreign_artist() {
        let mut transport = MockTransport::new();
        expect_user(&mut transport, Role::User);
        expect_artist_7(&mut transport, false);
        let (app, _) = started(transport).await;

        let rendered = app.open("/artists/7").await;

        assert_eq!(rendered.location, "/artists/7");
        assert!(controls(&rendered).is_empty());
    }

    #[tokio::test]
    async fn test_publisher_deletes_own_artist() {
        let mut transport = MockTransport::new();
        expect_user(&mut transport, Role::Publisher);
        expect_artist_7(&mut transport, true);
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Delete
                    && req.path == "artists/delete/"
                    && req.query_value("id") == Some("7")
            })
            .times(1)
            .returning(|_| Ok(empty_response(204)));
        transport
            .expect_send()
            .withf(|req| req.path == "artists/list/")
            .returning(|_| Ok(json_response(200, json!([]))));
        let (app, history) = started(transport).await;

        let rendered = app.open("/artists/7").await;
        let actions = controls(&rendered);
        assert!(actions.contains(&PageAction::Edit));
        assert!(actions.contains(&PageAction::Delete));

        let outcome = pages::artists::delete(app.context(), 7).await;
        assert_eq!(outcome, Outcome::Navigated);
        assert_eq!(history.current(), "/artists");
        assert_eq!(app.render_current().await.location, "/artists");
    }

    #[tokio::test]
    async fn test_song_create_sends_only_set_fields() {
        let mut transport = MockTransport::new();
        expect_user(&mut transport, Role::Publisher);
        transport
            .expect_send()
            .withf(|req| req.path == "albums/is_owner/")
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        transport
            .expect_send()
            .withf(|req| {
                req.path == "songs/create/"
                    && field_names(&req.body) == vec!["title", "album_id", "genre", "audio_file"]
            })
            .times(1)
            .returning(|_| Ok(json_response(201, json!({"id": 5, "title": "Lilac Wine"}))));
        let (app, history) = started(transport).await;

        let route = Route::SongCreate(3);
        assert!(app.enter(&route));
        let draft = SongDraft {
            title: "Lilac Wine".to_string(),
            album_id: 3,
            release_date: None,
            genre: Genre::default(),
            audio_file: Attachment::new("lilac-wine.mp3", b"ID3".to_vec()),
            cover_image: None,
        };
        assert_eq!(pages::songs::create(app.context(), draft).await, Outcome::Navigated);
        assert_eq!(history.current(), "/albums/3");
    }

    #[tokio::test]
    async fn test_signed_out_redirects_before_protected_fetch() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .returning(|_| Ok(json_response(401, json!({"detail": "Unauthenticated!"}))));
        let (app, history) = started(transport).await;

        let rendered = app.open("/admin").await;

        assert_eq!(rendered.location, "/login");
        assert!(matches!(rendered.state, PageState::Ready(ref view) if view.title == "Sign in"));
        assert_eq!(history.entries(), vec!["/", "/admin", "/login"]);
    }

    #[tokio::test]
    async fn test_wrong_role_lands_on_start_page() {
        let mut transport = MockTransport::new();
        expect_user(&mut transport, Role::User);
        let (app, _) = started(transport).await;

        let rendered = app.open("/my-artists").await;

        assert_eq!(rendered.location, "/");
        assert!(!app.enter(&Route::ArtistCreate));
    }

    #[tokio::test]
    async fn test_expired_session_mid_page_goes_to_login() {
        let mut transport = MockTransport::new();
        expect_user(&mut transport, Role::User);
        transport
            .expect_send()
            .withf(|req| req.path == "albums/list/")
            .returning(|_| Ok(json_response(401, json!({"detail": "Token Expired"}))));
        let (app, _) = started(transport).await;

        let rendered = app.open("/albums").await;

        assert_eq!(rendered.location, "/login");
        assert!(app.context().session.identity().is_none());
    }

    #[tokio::test]
    async fn test_loading_before_start() {
        let history = Arc::new(History::new("/"));
        let app = App::new(Arc::new(MockTransport::new()), history);

        let rendered = app.open("/songs").await;

        assert_eq!(rendered.state, PageState::Loading);
        assert_eq!(app.open("/").await.location, "/");
    }

    #[tokio::test]
    async fn test_unknown_path_is_public() {
        let (app, _) = started({
            let mut transport = MockTransport::new();
            transport
                .expect_send()
                .returning(|_| Ok(json_response(401, json!({}))));
            transport
        })
        .await;

        let rendered = app.open("/nowhere").await;

        assert_eq!(rendered.location, "/nowhere");
        assert!(rendered.to_string().contains("Page not found"));
    }
}
