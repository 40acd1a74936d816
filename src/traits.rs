use serde::{de::DeserializeOwned, Serialize};

/// A top-level document living in one store collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn ident(&self) -> &str;
}
