use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use tracing::{debug, warn};

use crate::store::{Collection, Document, DocumentStore, StoreError};

const MAX_RECORDED_CAUSES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Ok(usize),
    PartialFailure {
        inserted: usize,
        skipped: usize,
        cause: String,
    },
}

/// Aggregate of every batch outcome for one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub batches: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed_batches: usize,
    pub causes: Vec<String>,
}

impl SinkReport {
    pub fn record(&mut self, outcome: &BatchOutcome) {
        self.batches += 1;
        match outcome {
            BatchOutcome::Ok(inserted) => self.inserted += inserted,
            BatchOutcome::PartialFailure {
                inserted,
                skipped,
                cause,
            } => {
                self.inserted += inserted;
                self.skipped += skipped;
                self.failed_batches += 1;
                if self.causes.len() < MAX_RECORDED_CAUSES {
                    self.causes.push(cause.clone());
                }
            }
        }
    }

    /// Counts an entity dropped before it reached a batch.
    pub fn skip(&mut self, cause: String) {
        self.skipped += 1;
        if self.causes.len() < MAX_RECORDED_CAUSES {
            self.causes.push(cause);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_batches == 0 && self.skipped == 0
    }
}

impl fmt::Display for SinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} skipped in {} batches ({} with failures)",
            self.inserted, self.skipped, self.batches, self.failed_batches
        )
    }
}

/// Buffers entities of one kind and writes them as unordered bulk inserts of
/// `batch_size` documents. Failed batches never stop the writer.
pub struct BatchWriter<'s, T, S: DocumentStore + ?Sized> {
    store: &'s mut S,
    collection: Collection,
    batch_size: usize,
    pending: Vec<Document>,
    report: SinkReport,
    _kind: PhantomData<T>,
}

impl<'s, T: Serialize, S: DocumentStore + ?Sized> BatchWriter<'s, T, S> {
    pub fn new(store: &'s mut S, collection: Collection, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            collection,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            report: SinkReport::default(),
            _kind: PhantomData,
        }
    }

    pub fn push(&mut self, entity: &T) {
        match serde_json::to_value(entity) {
            Ok(doc) => self.pending.push(doc),
            Err(err) => {
                self.report.skip(format!("serialization failed: {err}"));
                return;
            }
        }
        if self.pending.len() >= self.batch_size {
            self.flush();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn flush(&mut self) -> Option<BatchOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        let docs = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));
        let submitted = docs.len();
        let outcome = match self.store.insert_many(self.collection, docs) {
            Ok(inserted) => BatchOutcome::Ok(inserted),
            Err(StoreError::BulkWrite {
                inserted,
                failed,
                cause,
                ..
            }) => BatchOutcome::PartialFailure {
                inserted,
                skipped: failed,
                cause,
            },
            Err(other) => BatchOutcome::PartialFailure {
                inserted: 0,
                skipped: submitted,
                cause: other.to_string(),
            },
        };
        debug!(
            collection = self.collection.name(),
            submitted,
            outcome = ?outcome,
            "flushed batch"
        );
        self.report.record(&outcome);
        Some(outcome)
    }

    /// Flushes the remainder and returns the aggregated report.
    pub fn finish(mut self) -> SinkReport {
        self.flush();
        if !self.report.is_clean() {
            warn!(
                collection = self.collection.name(),
                skipped = self.report.skipped,
                failed_batches = self.report.failed_batches,
                first_cause = self.report.causes.first().map(String::as_str),
                "batch writes partially failed"
            );
        }
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::{Filter, IndexSpec};

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "_id")]
        id: u32,
    }

    struct Unreachable;

    impl DocumentStore for Unreachable {
        fn drop_collection(&mut self, _collection: Collection) {}

        fn create_index(
            &mut self,
            _collection: Collection,
            _spec: IndexSpec,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        fn insert_many(
            &mut self,
            collection: Collection,
            _docs: Vec<Document>,
        ) -> Result<usize, StoreError> {
            Err(StoreError::IndexExists {
                collection: collection.name(),
                index: "down".to_string(),
            })
        }

        fn count_documents(&self, _collection: Collection, _filter: &Filter) -> usize {
            0
        }

        fn find(&self, _collection: Collection, _filter: &Filter) -> Vec<&Document> {
            vec![]
        }
    }

    #[test]
    fn test_flushes_at_batch_size() {
        let mut store = InMemoryStore::new();
        let mut writer = BatchWriter::new(&mut store, Collection::Users, 3);
        for id in 0..7 {
            writer.push(&Row { id });
        }
        assert_eq!(1, writer.pending());
        let report = writer.finish();
        assert_eq!(3, report.batches);
        assert_eq!(7, report.inserted);
        assert!(report.is_clean());
        assert_eq!(7, store.count_documents(Collection::Users, &Filter::all()));
    }

    #[test]
    fn test_duplicate_keys_do_not_stop_writer() {
        let mut store = InMemoryStore::new();
        store
            .create_index(Collection::Users, IndexSpec::new("users_id", &["_id"]).unique())
            .unwrap();
        let mut writer = BatchWriter::new(&mut store, Collection::Users, 2);
        for id in [0, 0, 1, 2, 2, 3] {
            writer.push(&Row { id });
        }
        let report = writer.finish();
        assert_eq!(3, report.batches);
        assert_eq!(4, report.inserted);
        assert_eq!(2, report.skipped);
        assert_eq!(2, report.failed_batches);
        assert_eq!(2, report.causes.len());
        assert_eq!(4, store.count_documents(Collection::Users, &Filter::all()));
    }

    #[test]
    fn test_store_errors_become_partial_failures() {
        let mut store = Unreachable;
        let mut writer = BatchWriter::new(&mut store, Collection::Edges, 2);
        writer.push(&Row { id: 1 });
        assert_eq!(
            Some(BatchOutcome::PartialFailure {
                inserted: 0,
                skipped: 1,
                cause: "index `down` already exists on `edges`".to_string(),
            }),
            writer.flush()
        );
        assert_eq!(None, writer.flush());
        let report = writer.finish();
        assert_eq!(1, report.skipped);
        assert_eq!("0 inserted, 1 skipped in 1 batches (1 with failures)", report.to_string());
    }
}
