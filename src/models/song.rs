use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Album, Attachment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Genre {
    Pop,
    Rock,
    Jazz,
    Classical,
    HipHop,
    Country,
    Electronic,
    #[default]
    Other,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Pop,
        Genre::Rock,
        Genre::Jazz,
        Genre::Classical,
        Genre::HipHop,
        Genre::Country,
        Genre::Electronic,
        Genre::Other,
    ];

    /// Wire value, e.g. `HIPHOP`.
    pub fn code(&self) -> &'static str {
        match self {
            Genre::Pop => "POP",
            Genre::Rock => "ROCK",
            Genre::Jazz => "JAZZ",
            Genre::Classical => "CLASSICAL",
            Genre::HipHop => "HIPHOP",
            Genre::Country => "COUNTRY",
            Genre::Electronic => "ELECTRONIC",
            Genre::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::HipHop => "Hip-Hop",
            Genre::Country => "Country",
            Genre::Electronic => "Electronic",
            Genre::Other => "Other",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "");
        Genre::ALL
            .into_iter()
            .find(|genre| genre.code() == wanted)
            .ok_or_else(|| {
                let known = Genre::ALL.map(|g| g.code()).join(", ");
                format!("unknown genre `{}` (expected one of {})", s, known)
            })
    }
}

/// A song's album, either as a bare id or embedded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlbumRef {
    Id(i64),
    Embedded(Box<Album>),
}

impl AlbumRef {
    pub fn id(&self) -> i64 {
        match self {
            AlbumRef::Id(id) => *id,
            AlbumRef::Embedded(album) => album.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub likes: i64,
    /// Backend duration string, e.g. `00:03:25`.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongDraft {
    pub title: String,
    pub album_id: i64,
    pub release_date: Option<NaiveDate>,
    pub genre: Genre,
    pub audio_file: Attachment,
    pub cover_image: Option<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongPatch {
    pub title: Option<String>,
    pub album_id: Option<i64>,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<Genre>,
    pub audio_file: Option<Attachment>,
    pub cover_image: Option<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_parsing() {
        assert_eq!("hip-hop".parse::<Genre>().unwrap(), Genre::HipHop);
        assert_eq!("ROCK".parse::<Genre>().unwrap(), Genre::Rock);
        assert!("polka".parse::<Genre>().is_err());
    }

    #[test]
    fn test_song_defaults() {
        let song: Song = serde_json::from_str(
            r#"{"id": 4, "title": "River", "album": 2, "audio_file": "/media/songs/audio/river.mp3"}"#,
        )
        .unwrap();
        assert_eq!(song.genre, Genre::Other);
        assert_eq!(song.likes, 0);
        assert_eq!(song.album.map(|album| album.id()), Some(2));
    }

    #[test]
    fn test_genre_wire_format() {
        let encoded = serde_json::to_string(&Genre::HipHop).unwrap();
        assert_eq!(encoded, "\"HIPHOP\"");
    }
}
