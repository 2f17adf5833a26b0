use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use crate::db::{DocumentStore, Fields, WriteOp};
use crate::error::{AppError, Result};

type Collection = HashMap<String, Fields>;

/// Process-local document store with the same merge and update semantics as
/// the Firestore backend. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    commit_sizes: Mutex<Vec<usize>>,
    fail_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every commit after the first `commits` fail.
    pub fn fail_after_commits(mut self, commits: usize) -> Self {
        self.fail_after = Some(commits);
        self
    }

    /// Size of each successful batch commit, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commit_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, HashMap::len)
    }

    pub fn documents(&self, collection: &str) -> Vec<(String, Fields)> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| (id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stores a document as-is, replacing any existing one.
    pub fn insert(&self, collection: &str, doc_id: &str, fields: Fields) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .insert(doc_id.to_string(), fields);
    }

    fn stamp(fields: &mut Fields, server_timestamps: &[&str]) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        for name in server_timestamps {
            fields.insert((*name).to_string(), Value::String(now.clone()));
        }
    }

    fn merge(target: &mut Fields, fields: Fields, server_timestamps: &[&str]) {
        target.extend(fields);
        Self::stamp(target, server_timestamps);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        let mut commit_sizes = self
            .commit_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.fail_after.is_some_and(|limit| commit_sizes.len() >= limit) {
            return Err(AppError::Storage(format!(
                "commit rejected after {} batches",
                commit_sizes.len()
            )));
        }

        let size = writes.len();
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        for write in writes {
            let doc = collections
                .entry(write.collection.to_string())
                .or_default()
                .entry(write.doc_id)
                .or_default();
            Self::merge(doc, write.fields, &write.server_timestamps);
        }

        commit_sizes.push(size);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(doc_id))
            .ok_or_else(|| {
                AppError::NotFound(format!("No document to update: {}/{}", collection, doc_id))
            })?;

        Self::merge(doc, fields, server_timestamps);
        Ok(())
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Fields>> {
        Ok(self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .and_then(|docs| docs.get(doc_id))
            .cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::USERS;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_merge_set_preserves_unlisted_fields() {
        let store = MemoryStore::new();
        store.insert(USERS, "u1", fields(json!({ "name": "Old", "bio": "kept" })));

        store
            .commit(vec![WriteOp {
                collection: USERS,
                doc_id: "u1".into(),
                fields: fields(json!({ "name": "New" })),
                server_timestamps: vec!["updatedAt"],
            }])
            .await
            .unwrap();

        let doc = store.get(USERS, "u1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "New");
        assert_eq!(doc["bio"], "kept");
        assert!(doc["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(USERS, "nobody", fields(json!({ "name": "x" })), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.count(USERS), 0);
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = MemoryStore::new();
        assert_eq!(store.get(USERS, "nobody").await.unwrap(), None);
    }
}
