use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{error::StoreError, general_helpers::new_id, traits::Document};

pub mod boards;
pub mod memory;
pub mod redis_store;
pub mod users;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

pub enum Keys {}

impl Keys {
    pub const BOARDS_KEY: &'static str = "board";
    pub const USERS_KEY: &'static str = "user";
}

/// Selects documents by id and/or by equality on dotted field paths (`createdBy._id`).
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    id: Option<String>,
    fields: Vec<(String, Value)>,
}

impl Criteria {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        if let Some(id) = &self.id {
            if doc.get("_id").and_then(Value::as_str) != Some(id.as_str()) {
                return false;
            }
        }

        self.fields.iter().all(|(path, expected)| {
            let pointer = format!("/{}", path.replace('.', "/"));
            doc.pointer(&pointer) == Some(expected)
        })
    }
}

/// The storage collaborator: a collection-oriented JSON document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Option<Value>, StoreError>;

    /// Persists `doc`, assigning `_id` when it has none, and returns the id.
    async fn insert_one(&self, collection: &str, doc: Value) -> Result<String, StoreError>;

    /// Overwrites the given top-level fields of the first match and returns the merged document.
    async fn update_one(
        &self,
        collection: &str,
        criteria: &Criteria,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Deletes the first match; `false` when nothing matched.
    async fn delete_one(&self, collection: &str, criteria: &Criteria) -> Result<bool, StoreError>;
}

pub(crate) fn assign_id(collection: &str, doc: &mut Value) -> Result<String, StoreError> {
    let object = doc.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
        collection: collection.to_string(),
    })?;

    match object.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let id = new_id();
            object.insert("_id".into(), Value::String(id.clone()));
            Ok(id)
        }
    }
}

pub(crate) fn merge_fields(
    collection: &str,
    doc: &mut Value,
    fields: Map<String, Value>,
) -> Result<(), StoreError> {
    let object = doc.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
        collection: collection.to_string(),
    })?;

    for (key, value) in fields {
        if key != "_id" {
            object.insert(key, value);
        }
    }

    Ok(())
}

pub async fn find_typed<D: Document>(
    store: &dyn DocumentStore,
    criteria: &Criteria,
) -> Result<Vec<D>, StoreError> {
    store
        .find(D::COLLECTION, criteria)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}

pub async fn find_one_typed<D: Document>(
    store: &dyn DocumentStore,
    criteria: &Criteria,
) -> Result<Option<D>, StoreError> {
    store
        .find_one(D::COLLECTION, criteria)
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(StoreError::from)
}

/// Inserts `doc` and hands it back carrying its generated id.
pub async fn insert_typed<D: Document>(
    store: &dyn DocumentStore,
    doc: D,
) -> Result<D, StoreError> {
    let mut value = serde_json::to_value(&doc)?;
    let id = store.insert_one(D::COLLECTION, value.clone()).await?;
    if let Some(object) = value.as_object_mut() {
        object.insert("_id".into(), Value::String(id));
    }

    let doc: D = serde_json::from_value(value)?;
    tracing::debug!(collection = D::COLLECTION, id = %doc.ident(), "document inserted");
    Ok(doc)
}

pub async fn update_typed<D: Document>(
    store: &dyn DocumentStore,
    criteria: &Criteria,
    fields: Map<String, Value>,
) -> Result<Option<D>, StoreError> {
    store
        .update_one(D::COLLECTION, criteria, fields)
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(StoreError::from)
}
