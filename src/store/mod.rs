//! Document store seam used by the generator and the read side.

pub mod batch;
pub mod memory;

use serde_json::Value;
use thiserror::Error;

pub type Document = Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Users,
    Edges,
    Interactions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Users,
        Collection::Edges,
        Collection::Interactions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Edges => "edges",
            Collection::Interactions => "interactions",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("duplicate key in index `{index}` on `{collection}`: {key}")]
    DuplicateKey {
        collection: &'static str,
        index: String,
        key: String,
    },
    #[error("index `{index}` already exists on `{collection}`")]
    IndexExists {
        collection: &'static str,
        index: String,
    },
    #[error("bulk write on `{collection}` inserted {inserted}, failed {failed}: {cause}")]
    BulkWrite {
        collection: &'static str,
        inserted: usize,
        failed: usize,
        cause: String,
    },
}

/// Conjunction of field equality predicates; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    terms: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.terms.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.terms
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<String>,
    pub unique: bool,
    /// Only documents whose discriminant field equals the value are indexed.
    pub partial: Option<(String, Value)>,
}

impl IndexSpec {
    pub fn new(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            unique: false,
            partial: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn partial(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.partial = Some((field.to_string(), value.into()));
        self
    }

    pub fn covers(&self, doc: &Document) -> bool {
        match &self.partial {
            Some((field, value)) => doc.get(field) == Some(value),
            None => true,
        }
    }

    /// Key tuple of `doc` for this index, rendered as a JSON array.
    pub fn key_of(&self, doc: &Document) -> String {
        Value::Array(
            self.keys
                .iter()
                .map(|k| doc.get(k).cloned().unwrap_or(Value::Null))
                .collect(),
        )
        .to_string()
    }
}

pub trait DocumentStore {
    fn drop_collection(&mut self, collection: Collection);

    fn create_index(&mut self, collection: Collection, spec: IndexSpec) -> Result<(), StoreError>;

    /// Unordered bulk insert: every document is attempted even after a
    /// failure. Returns the inserted count, or `BulkWrite` when any failed.
    fn insert_many(
        &mut self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<usize, StoreError>;

    fn count_documents(&self, collection: Collection, filter: &Filter) -> usize;

    fn find(&self, collection: Collection, filter: &Filter) -> Vec<&Document>;
}

/// Drops every collection and recreates the indexes a generation run relies on.
pub fn prepare_collections<S: DocumentStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    for collection in Collection::ALL {
        store.drop_collection(collection);
    }
    store.create_index(Collection::Users, IndexSpec::new("users_id", &["_id"]).unique())?;
    store.create_index(
        Collection::Edges,
        IndexSpec::new("friend_pair", &["pair"])
            .unique()
            .partial("type", "friend"),
    )?;
    store.create_index(
        Collection::Edges,
        IndexSpec::new("follow_pair", &["src", "dst"])
            .unique()
            .partial("type", "follow"),
    )?;
    store.create_index(Collection::Edges, IndexSpec::new("edges_src", &["src"]))?;
    store.create_index(Collection::Edges, IndexSpec::new("edges_dst", &["dst"]))?;
    store.create_index(
        Collection::Interactions,
        IndexSpec::new("interactions_target", &["target"]),
    )?;
    Ok(())
}
