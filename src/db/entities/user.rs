use serde::{Deserialize, Serialize};

use crate::db::{Document, USERS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub username_lowercase: String,
    pub name: String,
    pub name_lowercase: String,
    pub bio: String,
    pub avatar_url: String,
    /// Same URL as `avatar_url`; older clients read this field.
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub followers_count: u32,
    pub following_count: u32,
}

impl User {
    pub fn new(id: String, username: String, name: String, bio: String, avatar: String) -> Self {
        Self {
            id,
            username_lowercase: username.to_lowercase(),
            username,
            name_lowercase: name.to_lowercase(),
            name,
            bio,
            photo_url: avatar.clone(),
            avatar_url: avatar,
            followers_count: 0,
            following_count: 0,
        }
    }
}

impl Document for User {
    const COLLECTION: &'static str = USERS;
    const SERVER_TIMESTAMPS: &'static [&'static str] = &["createdAt", "updatedAt"];

    fn doc_id(&self) -> Option<String> {
        Some(self.id.clone())
    }
}
