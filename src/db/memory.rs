use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{assign_id, merge_fields, Criteria, DocumentStore};

/// Process-local store keeping documents in insertion order per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| criteria.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| criteria.matches(doc)))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, mut doc: Value) -> Result<String, StoreError> {
        let id = assign_id(collection, &mut doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match docs
            .iter_mut()
            .find(|existing| existing.get("_id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }

        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        criteria: &Criteria,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| criteria.matches(doc)))
        else {
            return Ok(None);
        };

        merge_fields(collection, doc, fields)?;
        Ok(Some(doc.clone()))
    }

    async fn delete_one(&self, collection: &str, criteria: &Criteria) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match docs.iter().position(|doc| criteria.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
