pub mod guard;

use std::fmt;

use crate::models::Role;

pub const LOGIN_PATH: &str = "/login";
/// Where role-denied navigations land. Deliberately not an error page.
pub const NEUTRAL_PATH: &str = "/";

const PUBLISHERS: &[Role] = &[Role::Publisher];
const EDITORS: &[Role] = &[Role::Publisher, Role::Admin];
const ADMINS: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Signed-in identities whose role is in the set; empty means any role.
    Protected(&'static [Role]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    Login,
    Register,
    Home,
    Artists,
    MyArtists,
    ArtistCreate,
    Artist(i64),
    ArtistEdit(i64),
    /// New album for the given artist.
    AlbumCreate(i64),
    Albums,
    Album(i64),
    AlbumEdit(i64),
    /// New song on the given album.
    SongCreate(i64),
    Songs,
    SongEdit(i64),
    Settings,
    Admin,
    NotFound(String),
}

fn with_id(raw: &str, path: &str, make: fn(i64) -> Route) -> Route {
    match raw.parse::<i64>() {
        Ok(id) => make(id),
        Err(_) => Route::NotFound(path.to_string()),
    }
}

impl Route {
    pub fn parse(location: &str) -> Route {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Start,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["homepage"] => Route::Home,
            ["settings"] => Route::Settings,
            ["admin"] => Route::Admin,
            ["my-artists"] => Route::MyArtists,
            ["artists"] => Route::Artists,
            ["artists", "create"] => Route::ArtistCreate,
            ["artists", id] => with_id(id, path, Route::Artist),
            ["artists", id, "edit"] => with_id(id, path, Route::ArtistEdit),
            ["artists", id, "create"] => with_id(id, path, Route::AlbumCreate),
            ["albums"] => Route::Albums,
            ["albums", id] => with_id(id, path, Route::Album),
            ["albums", id, "edit"] => with_id(id, path, Route::AlbumEdit),
            ["albums", id, "add"] => with_id(id, path, Route::SongCreate),
            ["songs"] => Route::Songs,
            ["songs", id, "edit"] => with_id(id, path, Route::SongEdit),
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Start => "/".to_string(),
            Route::Login => LOGIN_PATH.to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/homepage".to_string(),
            Route::Artists => "/artists".to_string(),
            Route::MyArtists => "/my-artists".to_string(),
            Route::ArtistCreate => "/artists/create".to_string(),
            Route::Artist(id) => format!("/artists/{}", id),
            Route::ArtistEdit(id) => format!("/artists/{}/edit", id),
            Route::AlbumCreate(artist_id) => format!("/artists/{}/create", artist_id),
            Route::Albums => "/albums".to_string(),
            Route::Album(id) => format!("/albums/{}", id),
            Route::AlbumEdit(id) => format!("/albums/{}/edit", id),
            Route::SongCreate(album_id) => format!("/albums/{}/add", album_id),
            Route::Songs => "/songs".to_string(),
            Route::SongEdit(id) => format!("/songs/{}/edit", id),
            Route::Settings => "/settings".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Start | Route::Login | Route::Register | Route::NotFound(_) => Access::Public,
            Route::Home
            | Route::Artists
            | Route::Artist(_)
            | Route::Albums
            | Route::Album(_)
            | Route::Songs
            | Route::Settings => Access::Protected(&[]),
            Route::ArtistCreate | Route::MyArtists => Access::Protected(PUBLISHERS),
            Route::ArtistEdit(_)
            | Route::AlbumCreate(_)
            | Route::AlbumEdit(_)
            | Route::SongCreate(_)
            | Route::SongEdit(_) => Access::Protected(EDITORS),
            Route::Admin => Access::Protected(ADMINS),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
