use serde::{Deserialize, Serialize};

use super::artist::Artist;
use crate::db::{Document, ALBUMS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: u32,
    pub title: String,
    /// Release year, stored as a string.
    pub year: String,
    pub cover: String,
    pub artist: ArtistSnapshot,
}

/// Copy of the artist taken when the album was generated. Not kept in sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSnapshot {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub genre: String,
}

impl From<&Artist> for ArtistSnapshot {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name.clone(),
            image: artist.image.clone(),
            genre: artist.genre.clone(),
        }
    }
}

impl Document for Album {
    const COLLECTION: &'static str = ALBUMS;
    const SERVER_TIMESTAMPS: &'static [&'static str] = &["createdAt"];

    fn doc_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}
