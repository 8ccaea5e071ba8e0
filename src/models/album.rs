use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Artist, Attachment};

/// An album's artist, either as a bare id or embedded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistRef {
    Id(i64),
    Embedded(Box<Artist>),
}

impl ArtistRef {
    pub fn id(&self) -> i64 {
        match self {
            ArtistRef::Id(id) => *id,
            ArtistRef::Embedded(artist) => artist.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist: ArtistRef,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumDraft {
    pub title: String,
    pub artist_id: i64,
    pub release_date: Option<NaiveDate>,
    pub cover_image: Option<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub artist_id: Option<i64>,
    pub release_date: Option<NaiveDate>,
    pub cover_image: Option<Attachment>,
}
