use super::{Item, PageContext, PageState, PageView};
use crate::models::Role;

/// Public landing page. Signed-in users get a link straight to their home.
pub fn start(ctx: &PageContext) -> PageState {
    let mut links = vec![
        Item::link("Sign in", "/login"),
        Item::link("Create an account", "/register"),
    ];
    if ctx.session.identity().is_some() {
        links.insert(0, Item::link("Go to your home page", "/homepage"));
    }
    PageState::Ready(
        PageView::new("Welcome to Musicfy")
            .detail("Browse artists, albums and songs, or publish your own.")
            .section("Get started", links, ""),
    )
}

pub fn home(ctx: &PageContext) -> PageState {
    let Some(user) = ctx.session.identity() else {
        return PageState::Failed("Not signed in.".to_string());
    };
    let mut links = vec![
        Item::link("Artists", "/artists"),
        Item::link("Albums", "/albums"),
        Item::link("Songs", "/songs"),
    ];
    match user.role {
        Role::Publisher => links.push(Item::link("My artists", "/my-artists")),
        Role::Admin => links.push(Item::link("Administration", "/admin")),
        Role::User | Role::Guest => {}
    }
    links.push(Item::link("Settings", "/settings"));
    PageState::Ready(
        PageView::new("Home Page")
            .detail(format!("Welcome, {}.", user.name))
            .section("Browse", links, ""),
    )
}

pub fn settings(ctx: &PageContext) -> PageState {
    let Some(user) = ctx.session.identity() else {
        return PageState::Failed("Not signed in.".to_string());
    };
    PageState::Ready(
        PageView::new("Settings")
            .detail(format!("Name: {}", user.name))
            .detail(format!("Email: {}", user.email))
            .detail(format!("Role: {}", user.role))
            .section(
                "Account",
                vec![
                    Item::text("Change password: change-password --current <C> --new <N> --repeat <N>"),
                    Item::text("Sign out: logout"),
                ],
                "",
            ),
    )
}

/// Catalog totals for administrators.
pub async fn admin(ctx: &PageContext) -> PageState {
    let (artists, albums, songs) =
        tokio::join!(ctx.artists.list(), ctx.albums.list(), ctx.songs.list());
    let counts = match (artists, albums, songs) {
        (Ok(artists), Ok(albums), Ok(songs)) => (artists.len(), albums.len(), songs.len()),
        (Err(error), _, _) | (_, Err(error), _) | (_, _, Err(error)) => {
            return ctx.load_failed(error, "Failed to load catalog overview");
        }
    };
    PageState::Ready(
        PageView::new("Administration")
            .detail(format!("Artists: {}", counts.0))
            .detail(format!("Albums: {}", counts.1))
            .detail(format!("Songs: {}", counts.2))
            .section(
                "Manage",
                vec![
                    Item::link("Artists", "/artists"),
                    Item::link("Albums", "/albums"),
                    Item::link("Songs", "/songs"),
                ],
                "",
            ),
    )
}

pub fn not_found(path: &str) -> PageState {
    PageState::Ready(
        PageView::new("Page not found")
            .detail(format!("Nothing lives at {}.", path))
            .section("", vec![Item::link("Back to the start page", "/")], ""),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::navigation::History;
    use crate::ports::transport::{Method, MockTransport};
    use crate::test_utils::{json_response, user_json};

    async fn signed_in(mut transport: MockTransport, role: Role) -> PageContext {
        transport
            .expect_send()
            .withf(|req| req.method == Method::Get && req.path == "user")
            .returning(move |_| Ok(json_response(200, user_json(role))));
        let ctx = PageContext::new(Arc::new(transport), Arc::new(History::new("/")));
        ctx.session.refresh().await;
        ctx
    }

    fn hrefs(state: &PageState) -> Vec<String> {
        match state {
            PageState::Ready(view) => view
                .sections
                .iter()
                .flat_map(|section| section.items.iter())
                .filter_map(|item| item.href.clone())
                .collect(),
            other => panic!("expected a ready page, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_home_links_follow_role() {
        let publisher = signed_in(MockTransport::new(), Role::Publisher).await;
        let links = hrefs(&home(&publisher));
        assert!(links.contains(&"/my-artists".to_string()));
        assert!(!links.contains(&"/admin".to_string()));

        let admin = signed_in(MockTransport::new(), Role::Admin).await;
        let links = hrefs(&home(&admin));
        assert!(links.contains(&"/admin".to_string()));
        assert!(!links.contains(&"/my-artists".to_string()));
    }

    #[tokio::test]
    async fn test_admin_overview_counts() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "artists/list/")
            .returning(|_| Ok(json_response(200, json!([{"id": 1, "name": "A"}]))));
        transport
            .expect_send()
            .withf(|req| req.path == "albums/list/")
            .returning(|_| Ok(json_response(200, json!([]))));
        transport
            .expect_send()
            .withf(|req| req.path == "songs/list/")
            .returning(|_| {
                Ok(json_response(
                    200,
                    json!([{"id": 1, "title": "x"}, {"id": 2, "title": "y"}]),
                ))
            });
        let ctx = signed_in(transport, Role::Admin).await;

        let PageState::Ready(view) = admin(&ctx).await else {
            panic!("admin overview should load");
        };
        assert_eq!(view.details, vec!["Artists: 1", "Albums: 0", "Songs: 2"]);
    }

    #[test]
    fn test_not_found_page() {
        let PageState::Ready(view) = not_found("/nope") else {
            panic!("not found is always ready");
        };
        assert_eq!(view.title, "Page not found");
        assert!(view.details[0].contains("/nope"));
    }
}
