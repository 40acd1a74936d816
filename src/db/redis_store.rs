use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::{Map, Value};

use crate::error::StoreError;

use super::{assign_id, merge_fields, Criteria, DocumentStore};

/// One redis hash per collection: field = document id, value = the JSON document.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut con = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }

    async fn connection(&self) -> Result<redis::aio::Connection, StoreError> {
        Ok(self.client.get_tokio_connection().await?)
    }

    async fn load_all(
        con: &mut redis::aio::Connection,
        collection: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let mut docs = con
            .hgetall::<_, Vec<(String, String)>>(collection)
            .await?
            .into_iter()
            .map(|(_, doc)| serde_json::from_str::<Value>(&doc))
            .collect::<Result<Vec<_>, _>>()?;

        // hash order is arbitrary, keep listings stable
        docs.sort_by_key(|doc| doc.get("createdAt").and_then(Value::as_i64).unwrap_or(0));
        Ok(docs)
    }

    async fn load_one(
        con: &mut redis::aio::Connection,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Option<Value>, StoreError> {
        match criteria.id() {
            Some(id) => {
                let doc = con.hget::<_, _, Option<String>>(collection, id).await?;
                Ok(doc
                    .map(|doc| serde_json::from_str::<Value>(&doc))
                    .transpose()?
                    .filter(|doc| criteria.matches(doc)))
            }
            None => Ok(Self::load_all(con, collection)
                .await?
                .into_iter()
                .find(|doc| criteria.matches(doc))),
        }
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn find(&self, collection: &str, criteria: &Criteria) -> Result<Vec<Value>, StoreError> {
        let mut con = self.connection().await?;

        if criteria.id().is_some() {
            return Ok(Self::load_one(&mut con, collection, criteria)
                .await?
                .into_iter()
                .collect());
        }

        Ok(Self::load_all(&mut con, collection)
            .await?
            .into_iter()
            .filter(|doc| criteria.matches(doc))
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Option<Value>, StoreError> {
        let mut con = self.connection().await?;
        Self::load_one(&mut con, collection, criteria).await
    }

    async fn insert_one(&self, collection: &str, mut doc: Value) -> Result<String, StoreError> {
        let id = assign_id(collection, &mut doc)?;
        let mut con = self.connection().await?;

        let _: () = con
            .hset(collection, &id, serde_json::to_string(&doc)?)
            .await?;

        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        criteria: &Criteria,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut con = self.connection().await?;
        let Some(mut doc) = Self::load_one(&mut con, collection, criteria).await? else {
            return Ok(None);
        };

        merge_fields(collection, &mut doc, fields)?;
        let id = assign_id(collection, &mut doc)?;
        let _: () = con
            .hset(collection, &id, serde_json::to_string(&doc)?)
            .await?;

        Ok(Some(doc))
    }

    async fn delete_one(&self, collection: &str, criteria: &Criteria) -> Result<bool, StoreError> {
        let mut con = self.connection().await?;
        let Some(mut doc) = Self::load_one(&mut con, collection, criteria).await? else {
            return Ok(false);
        };

        let id = assign_id(collection, &mut doc)?;
        let removed: u64 = con.hdel(collection, &id).await?;

        Ok(removed > 0)
    }
}
