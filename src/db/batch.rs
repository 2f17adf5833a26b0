use crate::db::{DocumentStore, WriteOp};
use crate::error::Result;

/// Firestore's per-commit operation limit.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub batches: usize,
    pub writes: usize,
}

/// Splits an ordered list of writes into batches and commits them one after
/// another. A failed commit stops the run; batches committed before it stay
/// durable.
pub struct BatchWriter<'a> {
    store: &'a dyn DocumentStore,
    max_batch: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self::with_batch_size(store, MAX_BATCH_WRITES)
    }

    pub fn with_batch_size(store: &'a dyn DocumentStore, max_batch: usize) -> Self {
        Self {
            store,
            max_batch: max_batch.clamp(1, MAX_BATCH_WRITES),
        }
    }

    pub async fn commit_all(&self, writes: Vec<WriteOp>) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut pending = writes.into_iter().peekable();

        while pending.peek().is_some() {
            let batch: Vec<WriteOp> = pending.by_ref().take(self.max_batch).collect();
            let size = batch.len();

            self.store.commit(batch).await.map_err(|e| {
                tracing::error!(
                    "Batch {} failed after {} writes were committed: {}",
                    summary.batches + 1,
                    summary.writes,
                    e
                );
                e
            })?;

            summary.batches += 1;
            summary.writes += size;
            tracing::debug!("Committed batch {} ({} writes)", summary.batches, size);
        }

        Ok(summary)
    }
}

/// Number of commits needed for `total` writes.
pub fn batch_count(total: usize) -> usize {
    total.div_ceil(MAX_BATCH_WRITES)
}
