use super::songs::song_label;
use super::{Control, Item, Outcome, PageContext, PageState, PageView, require};
use crate::authz::{PageAction, permitted_actions, resolve_ownership};
use crate::models::{Album, AlbumDraft, AlbumPatch, ArtistRef};

fn describe(view: PageView, album: &Album) -> PageView {
    let artist = match &album.artist {
        ArtistRef::Embedded(artist) => format!("Artist: {} (/artists/{})", artist.name, artist.id),
        ArtistRef::Id(id) => format!("Artist: /artists/{}", id),
    };
    let mut view = view.detail(artist);
    if let Some(release_date) = album.release_date {
        view = view.detail(format!("Released: {}", release_date));
    }
    if let Some(cover) = &album.cover_image {
        view = view.detail(format!("Cover: {}", cover));
    }
    view
}

fn control(action: PageAction, id: i64) -> Control {
    match action {
        PageAction::Edit => Control::new(action, "Edit", format!("/albums/{}/edit", id)),
        PageAction::Delete => Control::new(action, "Delete", format!("album delete {} --yes", id)),
        PageAction::CreateChild => Control::new(action, "Add Song", format!("/albums/{}/add", id)),
    }
}

pub async fn list(ctx: &PageContext) -> PageState {
    let albums = match ctx.albums.list().await {
        Ok(albums) => albums,
        Err(error) => return ctx.load_failed(error, "Failed to load albums"),
    };
    let items = albums
        .iter()
        .map(|album| Item::link(&album.title, format!("/albums/{}", album.id)))
        .collect();
    PageState::Ready(PageView::new("Albums").section("", items, "No albums yet."))
}

pub async fn detail(ctx: &PageContext, id: i64) -> PageState {
    let (album, songs, owner) = tokio::join!(
        ctx.albums.get(id),
        ctx.songs.list_by_album(id),
        ctx.albums.is_owner(id),
    );
    let album = match album {
        Ok(album) => album,
        Err(error) => return ctx.load_failed(error, "Failed to load album"),
    };
    let songs = match songs {
        Ok(songs) => songs,
        Err(error) => return ctx.load_failed(error, "Failed to load album"),
    };
    let ownership = match resolve_ownership(owner) {
        Ok(ownership) => ownership,
        Err(error) => return ctx.load_failed(error, "Failed to load album"),
    };
    let actions = permitted_actions(ctx.role(), ownership, true);

    let mut view = describe(PageView::new(&album.title), &album);
    view.controls = actions.iter().map(|action| control(*action, id)).collect();
    // Songs inherit the album's ownership.
    let song_controls = |song_id: i64| {
        actions
            .iter()
            .filter_map(|action| super::songs::control(*action, song_id))
            .collect::<Vec<_>>()
    };
    let items = songs
        .iter()
        .map(|song| Item {
            controls: song_controls(song.id),
            ..Item::text(song_label(song))
        })
        .collect();
    PageState::Ready(view.section("Songs", items, "No songs in this album."))
}

pub async fn create_form(ctx: &PageContext, artist_id: i64) -> PageState {
    match ctx.artists.get(artist_id).await {
        Ok(artist) => PageState::Ready(
            PageView::new(format!("Create Album for {}", artist.name)).detail(format!(
                "album create --artist {} --title <TITLE> [--release-date <YYYY-MM-DD>] [--cover <FILE>]",
                artist_id
            )),
        ),
        Err(error) => ctx.load_failed(error, "Failed to load artist"),
    }
}

pub async fn edit_form(ctx: &PageContext, id: i64) -> PageState {
    match ctx.albums.get(id).await {
        Ok(album) => PageState::Ready(
            describe(PageView::new(format!("Edit {}", album.title)), &album).detail(format!(
                "album edit {} [--title <TITLE>] [--release-date <YYYY-MM-DD>] [--cover <FILE>]",
                id
            )),
        ),
        Err(error) => ctx.load_failed(error, "Failed to load album"),
    }
}

/// Creating an album needs mutation rights on its artist.
pub async fn create(ctx: &PageContext, draft: AlbumDraft) -> Outcome {
    if let Err(rejected) = require(&draft.title, "Title is required.") {
        return rejected;
    }
    if let Err(outcome) = ctx.gate(
        ctx.artists.is_owner(draft.artist_id).await,
        "You do not have permission to add albums to this artist.",
    ) {
        return outcome;
    }
    match ctx.albums.create(draft).await {
        Ok(album) => ctx.go(&format!("/albums/{}", album.id)),
        Err(error) => ctx.action_failed(error, "Failed to create album."),
    }
}

pub async fn edit(ctx: &PageContext, id: i64, patch: AlbumPatch) -> Outcome {
    if let Some(title) = &patch.title {
        if let Err(rejected) = require(title, "Title is required.") {
            return rejected;
        }
    }
    if let Err(outcome) = ctx.gate(
        ctx.albums.is_owner(id).await,
        "You do not have permission to edit this album.",
    ) {
        return outcome;
    }
    match ctx.albums.edit(id, patch).await {
        Ok(_) => ctx.go(&format!("/albums/{}", id)),
        Err(error) => ctx.action_failed(error, "Failed to save album."),
    }
}

pub async fn delete(ctx: &PageContext, id: i64) -> Outcome {
    if let Err(outcome) = ctx.gate(
        ctx.albums.is_owner(id).await,
        "You do not have permission to delete this album.",
    ) {
        return outcome;
    }
    match ctx.albums.delete(id).await {
        Ok(()) => ctx.go("/albums"),
        Err(error) => ctx.action_failed(error, "Failed to delete album."),
    }
}
