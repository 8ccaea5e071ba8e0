use std::collections::{BTreeSet, HashMap};

use futures::{StreamExt, stream};

use super::{Control, Item, Outcome, PageContext, PageState, PageView, require};
use crate::authz::{Ownership, PageAction, permitted_actions, resolve_ownership};
use crate::error::ApiResult;
use crate::models::{AlbumRef, Genre, Role, Song, SongDraft, SongPatch};

/// Upper bound on ownership lookups in flight for one page.
const OWNERSHIP_LOOKUPS: usize = 4;

pub(super) fn song_label(song: &Song) -> String {
    let mut label = format!("{} - {}", song.title, song.genre.label());
    if let Some(duration) = &song.duration {
        label.push_str(&format!(" - {}", duration));
    }
    label
}

/// Control for one song. Songs have no children, so `CreateChild` has none.
pub(super) fn control(action: PageAction, id: i64) -> Option<Control> {
    match action {
        PageAction::Edit => Some(Control::new(action, "Edit", format!("/songs/{}/edit", id))),
        PageAction::Delete => Some(Control::new(
            action,
            "Delete",
            format!("song delete {} --yes", id),
        )),
        PageAction::CreateChild => None,
    }
}

fn genre_codes() -> String {
    Genre::ALL
        .iter()
        .map(Genre::code)
        .collect::<Vec<_>>()
        .join("|")
}

/// Ownership for every song on a page.
///
/// A song belongs to whoever owns its album, so publishers get one lookup per
/// distinct album. Admins may mutate anything and other roles never own, so
/// they get no lookups at all. Songs without an album are checked one by one.
/// Only an expired session is an error; other failed lookups mean "not owner".
async fn song_ownership(ctx: &PageContext, songs: &[Song]) -> ApiResult<HashMap<i64, Ownership>> {
    if ctx.role() != Some(Role::Publisher) {
        return Ok(songs
            .iter()
            .map(|song| (song.id, Ownership::Resolved(false)))
            .collect());
    }

    let album_ids: BTreeSet<i64> = songs
        .iter()
        .filter_map(|song| song.album.as_ref().map(AlbumRef::id))
        .collect();
    let by_album: Vec<(i64, ApiResult<Ownership>)> = stream::iter(album_ids)
        .map(|album_id| async move {
            (album_id, resolve_ownership(ctx.albums.is_owner(album_id).await))
        })
        .buffer_unordered(OWNERSHIP_LOOKUPS)
        .collect()
        .await;
    let by_album = by_album
        .into_iter()
        .map(|(album_id, ownership)| ownership.map(|ownership| (album_id, ownership)))
        .collect::<ApiResult<HashMap<i64, Ownership>>>()?;

    let orphans = songs.iter().filter(|song| song.album.is_none()).map(|song| song.id);
    let by_song: Vec<(i64, ApiResult<Ownership>)> = stream::iter(orphans)
        .map(|song_id| async move {
            (song_id, resolve_ownership(ctx.songs.is_owner(song_id).await))
        })
        .buffer_unordered(OWNERSHIP_LOOKUPS)
        .collect()
        .await;
    let by_song = by_song
        .into_iter()
        .map(|(song_id, ownership)| ownership.map(|ownership| (song_id, ownership)))
        .collect::<ApiResult<HashMap<i64, Ownership>>>()?;

    tracing::debug!(
        albums = by_album.len(),
        orphans = by_song.len(),
        "Resolved song ownership"
    );

    Ok(songs
        .iter()
        .map(|song| {
            let ownership = match &song.album {
                Some(album) => by_album.get(&album.id()),
                None => by_song.get(&song.id),
            };
            (song.id, ownership.copied().unwrap_or_default())
        })
        .collect())
}

pub async fn list(ctx: &PageContext) -> PageState {
    let songs = match ctx.songs.list().await {
        Ok(songs) => songs,
        Err(error) => return ctx.load_failed(error, "Failed to load songs"),
    };
    let ownership = match song_ownership(ctx, &songs).await {
        Ok(ownership) => ownership,
        Err(error) => return ctx.load_failed(error, "Failed to load songs"),
    };
    let role = ctx.role();

    let items = songs
        .iter()
        .map(|song| {
            let owned = ownership.get(&song.id).copied().unwrap_or_default();
            let controls = permitted_actions(role, owned, false)
                .into_iter()
                .filter_map(|action| control(action, song.id))
                .collect();
            let label = song_label(song);
            let item = match &song.album {
                Some(album) => Item::link(label, format!("/albums/{}", album.id())),
                None => Item::text(label),
            };
            Item { controls, ..item }
        })
        .collect();
    PageState::Ready(PageView::new("Songs").section("", items, "No songs yet."))
}

pub async fn create_form(ctx: &PageContext, album_id: i64) -> PageState {
    match ctx.albums.get(album_id).await {
        Ok(album) => PageState::Ready(
            PageView::new(format!("Add Song to {}", album.title)).detail(format!(
                "song create --album {} --title <TITLE> --audio <FILE> [--genre <{}>] [--release-date <YYYY-MM-DD>] [--cover <FILE>]",
                album_id,
                genre_codes()
            )),
        ),
        Err(error) => ctx.load_failed(error, "Failed to load album"),
    }
}

pub async fn edit_form(ctx: &PageContext, id: i64) -> PageState {
    match ctx.songs.get(id).await {
        Ok(song) => {
            let mut view = PageView::new(format!("Edit {}", song.title))
                .detail(format!("Genre: {}", song.genre.label()));
            if let Some(release_date) = song.release_date {
                view = view.detail(format!("Released: {}", release_date));
            }
            PageState::Ready(view.detail(format!(
                "song edit {} [--title <TITLE>] [--genre <{}>] [--release-date <YYYY-MM-DD>] [--audio <FILE>] [--cover <FILE>]",
                id,
                genre_codes()
            )))
        }
        Err(error) => ctx.load_failed(error, "Failed to load song"),
    }
}

/// Adding a song needs mutation rights on the target album.
pub async fn create(ctx: &PageContext, draft: SongDraft) -> Outcome {
    if let Err(rejected) = require(&draft.title, "Title is required.") {
        return rejected;
    }
    let album_id = draft.album_id;
    if let Err(outcome) = ctx.gate(
        ctx.albums.is_owner(album_id).await,
        "You do not have permission to add songs to this album.",
    ) {
        return outcome;
    }
    match ctx.songs.create(draft).await {
        Ok(_) => ctx.go(&format!("/albums/{}", album_id)),
        Err(error) => ctx.action_failed(error, "Failed to create song."),
    }
}

pub async fn edit(ctx: &PageContext, id: i64, patch: SongPatch) -> Outcome {
    if let Some(title) = &patch.title {
        if let Err(rejected) = require(title, "Title is required.") {
            return rejected;
        }
    }
    if let Err(outcome) = ctx.gate(
        ctx.songs.is_owner(id).await,
        "You do not have permission to edit this song.",
    ) {
        return outcome;
    }
    match ctx.songs.edit(id, patch).await {
        Ok(_) => ctx.go("/songs"),
        Err(error) => ctx.action_failed(error, "Failed to save song."),
    }
}

pub async fn delete(ctx: &PageContext, id: i64) -> Outcome {
    if let Err(outcome) = ctx.gate(
        ctx.songs.is_owner(id).await,
        "You do not have permission to delete this song.",
    ) {
        return outcome;
    }
    match ctx.songs.delete(id).await {
        Ok(()) => ctx.go("/songs"),
        Err(error) => ctx.action_failed(error, "Failed to delete song."),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::models::Attachment;
    use crate::navigation::History;
    use crate::ports::navigator::Navigator;
    use crate::ports::transport::{Method, MockTransport};
    use crate::test_utils::{empty_response, field_names, form_text, json_response, user_json};

    async fn context(mut transport: MockTransport, role: Role) -> (PageContext, Arc<History>) {
        transport
            .expect_send()
            .withf(|req| req.path == "user")
            .returning(move |_| Ok(json_response(200, user_json(role))));
        let history = Arc::new(History::new("/songs"));
        let ctx = PageContext::new(Arc::new(transport), history.clone());
        ctx.session.refresh().await;
        (ctx, history)
    }

    fn expect_song_list(transport: &mut MockTransport) {
        transport
            .expect_send()
            .withf(|req| req.path == "songs/list/")
            .returning(|_| {
                Ok(json_response(
                    200,
                    json!([
                        {"id": 1, "title": "Sinnerman", "album": 3, "genre": "JAZZ"},
                        {"id": 2, "title": "Be My Husband", "album": 3, "genre": "JAZZ"},
                        {"id": 3, "title": "Feeling Good", "album": 4, "genre": "POP"},
                        {"id": 4, "title": "Demo", "album": null}
                    ]),
                ))
            });
    }

    fn ready(state: PageState) -> PageView {
        match state {
            PageState::Ready(view) => view,
            other => panic!("expected a ready page, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publisher_lookups_once_per_album() {
        let mut transport = MockTransport::new();
        expect_song_list(&mut transport);
        transport
            .expect_send()
            .withf(|req| req.path == "albums/is_owner/" && req.query_value("id") == Some("3"))
            .times(1)
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        transport
            .expect_send()
            .withf(|req| req.path == "albums/is_owner/" && req.query_value("id") == Some("4"))
            .times(1)
            .returning(|_| Ok(json_response(200, json!({"is_owner": false}))));
        transport
            .expect_send()
            .withf(|req| req.path == "songs/is_owner/" && req.query_value("id") == Some("4"))
            .times(1)
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        let (ctx, _) = context(transport, Role::Publisher).await;

        let view = ready(list(&ctx).await);
        let controls: Vec<usize> = view.sections[0]
            .items
            .iter()
            .map(|item| item.controls.len())
            .collect();

        assert_eq!(controls, vec![2, 2, 0, 2]);
        assert_eq!(view.sections[0].items[0].href.as_deref(), Some("/albums/3"));
    }

    #[tokio::test]
    async fn test_admin_needs_no_lookups() {
        let mut transport = MockTransport::new();
        expect_song_list(&mut transport);
        let (ctx, _) = context(transport, Role::Admin).await;

        let view = ready(list(&ctx).await);

        assert!(view.sections[0].items.iter().all(|item| item.controls.len() == 2));
    }

    #[tokio::test]
    async fn test_plain_user_needs_no_lookups() {
        let mut transport = MockTransport::new();
        expect_song_list(&mut transport);
        let (ctx, _) = context(transport, Role::User).await;

        let view = ready(list(&ctx).await);

        assert!(view.sections[0].items.iter().all(|item| item.controls.is_empty()));
    }

    #[tokio::test]
    async fn test_create_without_optional_fields() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "albums/is_owner/" && req.query_value("id") == Some("3"))
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.path == "songs/create/"
                    && field_names(&req.body) == vec!["title", "album_id", "genre", "audio_file"]
                    && form_text(&req.body, "genre").as_deref() == Some("OTHER")
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    201,
                    json!({"id": 30, "title": "Four Women", "album": 3}),
                ))
            });
        let (ctx, history) = context(transport, Role::Publisher).await;

        let draft = SongDraft {
            title: "Four Women".to_string(),
            album_id: 3,
            release_date: None,
            genre: Genre::default(),
            audio_file: Attachment::new("four-women.mp3", b"ID3\x03\x00".to_vec()),
            cover_image: None,
        };

        assert_eq!(create(&ctx, draft).await, Outcome::Navigated);
        assert_eq!(history.current(), "/albums/3");
    }

    #[tokio::test]
    async fn test_edit_navigates_to_songs() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "songs/is_owner/")
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        transport
            .expect_send()
            .withf(|req| req.path == "songs/edit/" && req.query_value("id") == Some("1"))
            .returning(|_| Ok(json_response(200, json!({"id": 1, "title": "Sinnerman (Live)"}))));
        let (ctx, history) = context(transport, Role::Publisher).await;
        history.navigate("/songs/1/edit");

        let patch = SongPatch {
            title: Some("Sinnerman (Live)".to_string()),
            ..SongPatch::default()
        };
        assert_eq!(edit(&ctx, 1, patch).await, Outcome::Navigated);
        assert_eq!(history.current(), "/songs");
    }

    #[tokio::test]
    async fn test_delete_with_expired_session_redirects_to_login() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "songs/is_owner/")
            .returning(|_| Ok(json_response(401, json!({"detail": "Token Expired"}))));
        let (ctx, history) = context(transport, Role::Publisher).await;

        assert_eq!(delete(&ctx, 1).await, Outcome::Navigated);
        assert_eq!(history.current(), "/login");
        assert!(ctx.session.identity().is_none());
    }

    #[tokio::test]
    async fn test_list_with_expired_ownership_lookup_redirects() {
        let mut transport = MockTransport::new();
        expect_song_list(&mut transport);
        transport
            .expect_send()
            .withf(|req| req.path == "albums/is_owner/" || req.path == "songs/is_owner/")
            .returning(|_| Ok(json_response(401, json!({"detail": "Token Expired"}))));
        let (ctx, history) = context(transport, Role::Publisher).await;

        assert_eq!(list(&ctx).await, PageState::Redirected);
        assert_eq!(history.current(), "/login");
    }

    #[test]
    fn test_song_controls_have_no_child_action() {
        assert!(control(PageAction::CreateChild, 1).is_none());
        assert_eq!(
            control(PageAction::Edit, 1).map(|control| control.target),
            Some("/songs/1/edit".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_song() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "songs/is_owner/")
            .returning(|_| Ok(json_response(200, json!({"is_owner": true}))));
        transport
            .expect_send()
            .withf(|req| req.method == Method::Delete && req.path == "songs/delete/")
            .times(1)
            .returning(|_| Ok(empty_response(204)));
        let (ctx, history) = context(transport, Role::Publisher).await;
        history.navigate("/albums/3");

        assert_eq!(delete(&ctx, 1).await, Outcome::Navigated);
        assert_eq!(history.current(), "/songs");
    }
}
