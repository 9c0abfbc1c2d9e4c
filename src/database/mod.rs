pub mod memory_store;
pub mod mongo_store;
pub mod planner;
pub mod repository;
pub mod store;

pub use memory_store::MemoryStore;
pub use mongo_store::MongoStore;
pub use repository::{parse_object_id, Repository};
pub use store::{DocumentStore, QueryPlan, StoreError};

use std::sync::Arc;

use crate::config::Config;
use crate::models::{CareerProfile, Mentorship, Project, Schema, Story, User, UserProfile};

/// Shared handle to the document store, cloned into every worker.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// MongoDB when `MONGODB_URI` is configured, otherwise the in-memory
    /// store. Indexes are created before the handle is returned.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let db = match &config.mongodb_uri {
            Some(uri) => {
                log::info!("📊 Connecting to MongoDB...");
                let store = MongoStore::connect(uri, &config.mongodb_database).await?;
                Self::new(Arc::new(store))
            }
            None => {
                log::warn!("⚠️  MONGODB_URI not set, using the in-memory store (data is lost on restart)");
                Self::in_memory()
            }
        };

        db.ensure_indexes().await?;
        Ok(db)
    }

    /// Creates the indexes every schema declares
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        self.ensure::<User>().await?;
        self.ensure::<CareerProfile>().await?;
        self.ensure::<UserProfile>().await?;
        self.ensure::<Story>().await?;
        self.ensure::<Project>().await?;
        self.ensure::<Mentorship>().await?;

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    async fn ensure<T: Schema>(&self) -> Result<(), StoreError> {
        self.store.ensure_indexes(T::COLLECTION, &T::indexes()).await
    }

    pub fn repo<T: Schema>(&self) -> Repository<T> {
        Repository::new(self.store.clone())
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}
