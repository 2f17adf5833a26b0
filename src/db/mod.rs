pub mod batch;
pub mod entities;
pub mod firestore;
pub mod memory;

pub use batch::{BatchSummary, BatchWriter, MAX_BATCH_WRITES};
pub use entities::*;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Top-level fields of a stored document.
pub type Fields = Map<String, Value>;

pub const USERS: &str = "users";
pub const ARTISTS: &str = "artists";
pub const ALBUMS: &str = "albums";
pub const REVIEWS: &str = "reviews";

const AUTO_ID_LEN: usize = 20;

/// A random 20-character alphanumeric document key, the same shape Firestore
/// assigns to `add()`-ed documents.
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// One set-with-merge write: fields in `fields` replace stored values, any
/// other stored field is kept. Names in `server_timestamps` are stamped by the
/// store at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub collection: &'static str,
    pub doc_id: String,
    pub fields: Fields,
    pub server_timestamps: Vec<&'static str>,
}

impl WriteOp {
    pub fn merge_set<D: Document>(doc: &D) -> Result<Self> {
        let fields = match serde_json::to_value(doc)? {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::Internal(format!(
                    "{} document did not serialize to an object: {}",
                    D::COLLECTION,
                    other
                )))
            }
        };

        Ok(Self {
            collection: D::COLLECTION,
            doc_id: doc.doc_id().unwrap_or_else(auto_id),
            fields,
            server_timestamps: D::SERVER_TIMESTAMPS.to_vec(),
        })
    }
}

/// An entity persisted as one document.
pub trait Document: Serialize {
    const COLLECTION: &'static str;
    const SERVER_TIMESTAMPS: &'static [&'static str];

    /// Natural key, or `None` for auto-keyed collections.
    fn doc_id(&self) -> Option<String>;
}

/// Document database with batch-commit semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Applies all writes atomically. Callers keep batches at or under
    /// [`MAX_BATCH_WRITES`].
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()>;

    /// Partial update of an existing document. Fails with
    /// [`AppError::NotFound`] when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()>;

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Fields>>;

    fn backend_name(&self) -> &'static str;
}
