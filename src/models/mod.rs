pub mod album;
pub mod artist;
pub mod attachment;
pub mod song;
pub mod user;

use serde::{Deserialize, Serialize};

pub use album::{Album, AlbumDraft, AlbumPatch, ArtistRef};
pub use artist::{Artist, ArtistDraft, ArtistPatch};
pub use attachment::Attachment;
pub use song::{AlbumRef, Genre, Song, SongDraft, SongPatch};
pub use user::{Role, User};

/// Body of every `is_owner` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerFlag {
    pub is_owner: bool,
}
