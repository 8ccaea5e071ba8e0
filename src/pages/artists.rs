use super::{Control, Item, Outcome, PageContext, PageState, PageView, require};
use crate::authz::{PageAction, permitted_actions, resolve_ownership};
use crate::models::{Artist, ArtistDraft, ArtistPatch};

fn describe(view: PageView, artist: &Artist) -> PageView {
    let mut view = view;
    if let Some(country) = &artist.country {
        view = view.detail(format!("Country: {}", country));
    }
    if let Some(birth_date) = artist.birth_date {
        view = view.detail(format!("Born: {}", birth_date));
    }
    if let Some(bio) = &artist.bio {
        view = view.detail(bio.clone());
    }
    view
}

fn control(action: PageAction, id: i64) -> Control {
    match action {
        PageAction::Edit => Control::new(action, "Edit", format!("/artists/{}/edit", id)),
        PageAction::Delete => {
            Control::new(action, "Delete", format!("artist delete {} --yes", id))
        }
        PageAction::CreateChild => {
            Control::new(action, "Create Album", format!("/artists/{}/create", id))
        }
    }
}

pub async fn list(ctx: &PageContext) -> PageState {
    let artists = match ctx.artists.list().await {
        Ok(artists) => artists,
        Err(error) => return ctx.load_failed(error, "Failed to load artists"),
    };
    let items = artists
        .iter()
        .map(|artist| Item::link(&artist.name, format!("/artists/{}", artist.id)))
        .collect();
    PageState::Ready(PageView::new("Artists").section("", items, "No artists yet."))
}

/// Artist, its albums and the ownership check load together; controls are
/// computed once all three have settled.
pub async fn detail(ctx: &PageContext, id: i64) -> PageState {
    let (artist, albums, owner) = tokio::join!(
        ctx.artists.get(id),
        ctx.albums.list_by_artist(id),
        ctx.artists.is_owner(id),
    );
    let artist = match artist {
        Ok(artist) => artist,
        Err(error) => return ctx.load_failed(error, "Failed to load artist"),
    };
    let albums = match albums {
        Ok(albums) => albums,
        Err(error) => return ctx.load_failed(error, "Failed to load artist"),
    };
    let ownership = match resolve_ownership(owner) {
        Ok(ownership) => ownership,
        Err(error) => return ctx.load_failed(error, "Failed to load artist"),
    };

    let mut view = describe(PageView::new(&artist.name), &artist);
    view.controls = permitted_actions(ctx.role(), ownership, true)
        .into_iter()
        .map(|action| control(action, id))
        .collect();
    let items = albums
        .iter()
        .map(|album| Item::link(&album.title, format!("/albums/{}", album.id)))
        .collect();
    PageState::Ready(view.section("Albums", items, "No albums yet."))
}

pub async fn my_artists(ctx: &PageContext) -> PageState {
    let artists = match ctx.artists.my_artists().await {
        Ok(artists) => artists,
        Err(error) => return ctx.load_failed(error, "Failed to load your artists"),
    };
    let items = artists
        .iter()
        .map(|artist| Item {
            controls: vec![control(PageAction::Edit, artist.id)],
            ..Item::link(&artist.name, format!("/artists/{}", artist.id))
        })
        .collect();
    let mut view = PageView::new("My Artists");
    view.controls
        .push(Control::new(PageAction::CreateChild, "Create Artist", "/artists/create"));
    PageState::Ready(view.section("", items, "You have not created any artists yet."))
}

pub fn create_form() -> PageState {
    PageState::Ready(
        PageView::new("Create Artist")
            .detail("artist create --name <NAME> [--bio <BIO>] [--birth-date <YYYY-MM-DD>] [--country <COUNTRY>]"),
    )
}

pub async fn edit_form(ctx: &PageContext, id: i64) -> PageState {
    match ctx.artists.get(id).await {
        Ok(artist) => PageState::Ready(
            describe(PageView::new(format!("Edit {}", artist.name)), &artist).detail(
                format!(
                    "artist edit {} [--name <NAME>] [--bio <BIO>] [--birth-date <YYYY-MM-DD>] [--country <COUNTRY>]",
                    id
                ),
            ),
        ),
        Err(error) => ctx.load_failed(error, "Failed to load artist"),
    }
}

pub async fn create(ctx: &PageContext, draft: ArtistDraft) -> Outcome {
    if let Err(rejected) = require(&draft.name, "Name is required.") {
        return rejected;
    }
    match ctx.artists.create(draft).await {
        Ok(artist) => ctx.go(&format!("/artists/{}", artist.id)),
        Err(error) => ctx.action_failed(error, "Failed to create artist."),
    }
}

pub async fn edit(ctx: &PageContext, id: i64, patch: ArtistPatch) -> Outcome {
    if let Some(name) = &patch.name {
        if let Err(rejected) = require(name, "Name is required.") {
            return rejected;
        }
    }
    if let Err(outcome) = ctx.gate(
        ctx.artists.is_owner(id).await,
        "You do not have permission to edit this artist.",
    ) {
        return outcome;
    }
    match ctx.artists.edit(id, patch).await {
        Ok(_) => ctx.go(&format!("/artists/{}", id)),
        Err(error) => ctx.action_failed(error, "Failed to save artist."),
    }
}

pub async fn delete(ctx: &PageContext, id: i64) -> Outcome {
    if let Err(outcome) = ctx.gate(
        ctx.artists.is_owner(id).await,
        "You do not have permission to delete this artist.",
    ) {
        return outcome;
    }
    match ctx.artists.delete(id).await {
        Ok(()) => ctx.go("/artists"),
        Err(error) => ctx.action_failed(error, "Failed to delete artist."),
    }
}
