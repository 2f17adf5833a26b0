use serde::{Deserialize, Serialize};

use crate::db::{Document, REVIEWS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub content: String,
    pub score: u8,
    /// Always `false` when generated; not derived from `score`.
    pub is_low_score: bool,
    pub user_id: String,
    pub album_id: u32,
    pub likes: u32,
}

impl Document for Review {
    const COLLECTION: &'static str = REVIEWS;
    const SERVER_TIMESTAMPS: &'static [&'static str] = &["createdAt", "updatedAt"];

    fn doc_id(&self) -> Option<String> {
        None
    }
}
