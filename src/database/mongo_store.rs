use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

use super::store::{DocumentStore, QueryPlan, StoreError};
use crate::models::IndexSpec;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.app_name = Some("career-canvas".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(database_name);

        // Test connection
        db.list_collection_names().await?;
        log::info!("Connected to MongoDB database: {}", database_name);

        Ok(Self { db })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn index_model(spec: &IndexSpec) -> IndexModel {
    let options = IndexOptions::builder()
        .name(spec.name.clone())
        .unique(spec.unique.then_some(true))
        .sparse(spec.sparse.then_some(true))
        .build();

    IndexModel::builder()
        .keys(spec.key_document())
        .options(options)
        .build()
}

/// Maps E11000 to `DuplicateKey`, pulling the index name out of the server
/// message (`... index: email_1 dup key: ...`).
fn map_write_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    let message = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE => {
            Some(e.message.clone())
        }
        ErrorKind::Command(e) if e.code == DUPLICATE_KEY_CODE => Some(e.message.clone()),
        _ => None,
    };

    match message {
        Some(message) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            index: duplicate_index_name(&message).unwrap_or("unknown").to_string(),
        },
        None => StoreError::from(err),
    }
}

fn duplicate_index_name(message: &str) -> Option<&str> {
    let start = message.find("index: ")? + "index: ".len();
    message[start..].split_whitespace().next()
}

/// First `indexName` found in an explain plan tree.
fn find_index_name(plan: &Document) -> Option<String> {
    if let Ok(name) = plan.get_str("indexName") {
        return Some(name.to_string());
    }
    if plan.get_str("stage").ok() == Some("IDHACK") {
        return Some(super::planner::ID_INDEX.to_string());
    }
    for key in ["inputStage", "queryPlan"] {
        if let Ok(child) = plan.get_document(key) {
            if let Some(name) = find_index_name(child) {
                return Some(name);
            }
        }
    }
    if let Ok(children) = plan.get_array("inputStages") {
        for child in children {
            if let Bson::Document(child) = child {
                if let Some(name) = find_index_name(child) {
                    return Some(name);
                }
            }
        }
    }
    None
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let coll = self.collection(collection);
        for spec in indexes {
            match coll.create_index(index_model(spec)).await {
                Ok(_) => log::info!("   ✅ Index ready: {}({})", collection, spec.name),
                Err(e) => {
                    log::error!("   ❌ Failed to create index {}({}): {}", collection, spec.name, e);
                    return Err(StoreError::from(e));
                }
            }
        }
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| map_write_error(collection, e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Database("inserted _id is not an ObjectId".into()))
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| map_write_error(collection, e))
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn explain(&self, collection: &str, filter: Document) -> Result<QueryPlan, StoreError> {
        let response = self
            .db
            .run_command(doc! {
                "explain": { "find": collection, "filter": filter },
                "verbosity": "queryPlanner",
            })
            .await?;

        let index = response
            .get_document("queryPlanner")
            .and_then(|planner| planner.get_document("winningPlan"))
            .ok()
            .and_then(find_index_name);

        Ok(QueryPlan {
            collection: collection.to_string(),
            index,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mentorship, Schema};

    #[test]
    fn duplicate_index_is_read_from_server_message() {
        let message = "E11000 duplicate key error collection: career_canvas.users index: email_1 dup key: { email: \"a@x.com\" }";
        assert_eq!(duplicate_index_name(message), Some("email_1"));
        assert_eq!(duplicate_index_name("something else"), None);
    }

    #[test]
    fn index_name_is_found_in_nested_winning_plan() {
        let plan = doc! {
            "stage": "FETCH",
            "inputStage": {
                "stage": "IXSCAN",
                "indexName": "mentor_id_1_mentee_id_1",
            },
        };
        assert_eq!(find_index_name(&plan).as_deref(), Some("mentor_id_1_mentee_id_1"));

        let scan = doc! { "stage": "COLLSCAN" };
        assert_eq!(find_index_name(&scan), None);
    }

    #[test]
    fn index_model_carries_name_and_flags() {
        let spec = IndexSpec::ascending(&["microsoft_id"]).unique().sparse();
        let model = index_model(&spec);
        let options = model.options.unwrap();
        assert_eq!(options.name.as_deref(), Some("microsoft_id_1"));
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.sparse, Some(true));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn pair_query_uses_compound_index_on_server() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
        let store = MongoStore::connect(&uri, "career_canvas_test").await.unwrap();
        store
            .ensure_indexes(Mentorship::COLLECTION, &Mentorship::indexes())
            .await
            .unwrap();

        let plan = store
            .explain(Mentorship::COLLECTION, Mentorship::pair_filter("m1", "e1"))
            .await
            .unwrap();
        assert!(plan.uses_index("mentor_id_1_mentee_id_1"));
    }
}
