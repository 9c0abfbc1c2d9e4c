use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use serde::Serialize;

use crate::models::IndexSpec;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key in {collection} (index {index})")]
    DuplicateKey { collection: String, index: String },

    #[error("database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Index chosen to answer a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct QueryPlan {
    pub collection: String,
    /// `None` means a full collection scan
    pub index: Option<String>,
}

impl QueryPlan {
    pub fn uses_index(&self, name: &str) -> bool {
        self.index.as_deref() == Some(name)
    }

    pub fn is_collection_scan(&self) -> bool {
        self.index.is_none()
    }
}

/// Storage backend for raw BSON documents.
///
/// Filters are equality filters on (possibly dotted) field paths; `{"$ne": v}`
/// matches when no value at the path equals `v`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> Result<(), StoreError>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError>;

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError>;

    /// Applies `$set`, `$unset`, `$push` or `$addToSet` to the first document matching
    /// `filter` in one atomic step and returns it as stored afterwards.
    /// `None` when nothing matches.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete_one(&self, collection: &str, id: ObjectId) -> Result<bool, StoreError>;

    async fn explain(&self, collection: &str, filter: Document) -> Result<QueryPlan, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
