use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::store::{Collection, Document, DocumentStore, Filter, IndexSpec, StoreError};

struct Index {
    spec: IndexSpec,
    seen: FxHashSet<String>,
}

#[derive(Default)]
struct CollectionData {
    docs: Vec<Document>,
    indexes: Vec<Index>,
}

impl CollectionData {
    /// Keys `doc` would occupy in every unique index it falls under, or the
    /// first violation.
    fn unique_keys(
        &self,
        collection: Collection,
        doc: &Document,
    ) -> Result<Vec<(usize, String)>, StoreError> {
        let mut keys = vec![];
        for (i, index) in self.indexes.iter().enumerate() {
            if !index.spec.unique || !index.spec.covers(doc) {
                continue;
            }
            let key = index.spec.key_of(doc);
            if index.seen.contains(&key) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.name(),
                    index: index.spec.name.clone(),
                    key,
                });
            }
            keys.push((i, key));
        }
        Ok(keys)
    }
}

/// In-process document store, deterministic in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    collections: BTreeMap<Collection, CollectionData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self, collection: Collection) -> &[Document] {
        self.collections
            .get(&collection)
            .map(|c| c.docs.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_names(&self, collection: Collection) -> Vec<&str> {
        self.collections
            .get(&collection)
            .map(|c| c.indexes.iter().map(|i| i.spec.name.as_str()).collect())
            .unwrap_or_default()
    }
}

impl DocumentStore for InMemoryStore {
    fn drop_collection(&mut self, collection: Collection) {
        if self.collections.remove(&collection).is_some() {
            debug!(collection = collection.name(), "dropped collection");
        }
    }

    fn create_index(&mut self, collection: Collection, spec: IndexSpec) -> Result<(), StoreError> {
        let data = self.collections.entry(collection).or_default();
        if data.indexes.iter().any(|i| i.spec.name == spec.name) {
            return Err(StoreError::IndexExists {
                collection: collection.name(),
                index: spec.name,
            });
        }
        let mut seen = FxHashSet::default();
        if spec.unique {
            for doc in data.docs.iter().filter(|d| spec.covers(d)) {
                let key = spec.key_of(doc);
                if !seen.insert(key.clone()) {
                    return Err(StoreError::DuplicateKey {
                        collection: collection.name(),
                        index: spec.name.clone(),
                        key,
                    });
                }
            }
        }
        data.indexes.push(Index { spec, seen });
        Ok(())
    }

    fn insert_many(
        &mut self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let data = self.collections.entry(collection).or_default();
        let mut inserted = 0;
        let mut failed = 0;
        let mut first_cause = None;
        for doc in docs {
            match data.unique_keys(collection, &doc) {
                Ok(keys) => {
                    for (i, key) in keys {
                        data.indexes[i].seen.insert(key);
                    }
                    data.docs.push(doc);
                    inserted += 1;
                }
                Err(err) => {
                    failed += 1;
                    if first_cause.is_none() {
                        first_cause = Some(err);
                    }
                }
            }
        }
        match first_cause {
            None => Ok(inserted),
            Some(cause) => Err(StoreError::BulkWrite {
                collection: collection.name(),
                inserted,
                failed,
                cause: cause.to_string(),
            }),
        }
    }

    fn count_documents(&self, collection: Collection, filter: &Filter) -> usize {
        self.documents(collection)
            .iter()
            .filter(|d| filter.matches(d))
            .count()
    }

    fn find(&self, collection: Collection, filter: &Filter) -> Vec<&Document> {
        self.documents(collection)
            .iter()
            .filter(|d| filter.matches(d))
            .collect()
    }
}
