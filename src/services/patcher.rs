use serde_json::Value;
use std::sync::Arc;

use crate::db::{DocumentStore, Fields, USERS};
use crate::error::{AppError, Result};

/// Fields whose lowercase copy is kept alongside them.
const LOWERCASE_MIRRORS: &[(&str, &str)] = &[
    ("username", "usernameLowercase"),
    ("name", "nameLowercase"),
];

const UPDATED_AT: &str = "updatedAt";

/// A validated partial update for one user document.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPatch {
    pub id: String,
    pub updates: Fields,
}

impl UserPatch {
    pub fn new(id: Option<&Value>, updates: Option<&Value>) -> Result<Self> {
        let id = match id {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(AppError::BadRequest("id is required".to_string())),
        };

        let updates = match updates {
            Some(Value::Object(map)) => map.clone(),
            // Query strings can only carry the object JSON-encoded.
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(AppError::BadRequest(
                        "updates must be a JSON object".to_string(),
                    ))
                }
            },
            Some(_) => {
                return Err(AppError::BadRequest(
                    "updates must be a JSON object".to_string(),
                ))
            }
            None => return Err(AppError::BadRequest("updates is required".to_string())),
        };

        Ok(Self { id, updates })
    }

    /// The update with lowercase mirrors filled in for any mirrored field
    /// present in it.
    pub fn fields(&self) -> Result<Fields> {
        let mut fields = self.updates.clone();

        for (source, mirror) in LOWERCASE_MIRRORS {
            let lowered = match fields.get(*source) {
                None => continue,
                Some(Value::String(value)) => Value::String(value.to_lowercase()),
                Some(Value::Null) => Value::Null,
                Some(_) => {
                    return Err(AppError::BadRequest(format!("{} must be a string", source)))
                }
            };
            fields.insert((*mirror).to_string(), lowered);
        }

        Ok(fields)
    }
}

#[derive(Clone)]
pub struct UserPatcher {
    store: Arc<dyn DocumentStore>,
}

impl UserPatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Applies the patch and returns the stored document as read back
    /// afterwards, with its key under `id`.
    pub async fn apply(&self, patch: &UserPatch) -> Result<Fields> {
        let fields = patch.fields()?;
        tracing::info!(
            "Updating user {} ({} fields)",
            patch.id,
            fields.len()
        );

        self.store
            .update(USERS, &patch.id, fields, &[UPDATED_AT])
            .await?;

        let mut user = self
            .store
            .get(USERS, &patch.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} vanished after update", patch.id)))?;

        user.entry("id")
            .or_insert_with(|| Value::String(patch.id.clone()));

        Ok(user)
    }
}
