use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Fields submitted when creating an artist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistDraft {
    pub name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub country: Option<String>,
}

/// Partial update; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub country: Option<String>,
}
