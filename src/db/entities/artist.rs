use serde::{Deserialize, Serialize};

use crate::db::{Document, ARTISTS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub genre: String,
}

impl Document for Artist {
    const COLLECTION: &'static str = ARTISTS;
    const SERVER_TIMESTAMPS: &'static [&'static str] = &["createdAt"];

    fn doc_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}
