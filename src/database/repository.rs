use mongodb::bson::{doc, from_document, oid::ObjectId, to_document, Document};
use std::marker::PhantomData;
use std::sync::Arc;

use super::store::{DocumentStore, QueryPlan};
use crate::models::{now_ts, Schema};
use crate::utils::AppError;

/// Typed access to one schema's collection.
///
/// Every write goes through `validate()`. Inserts stamp both timestamps;
/// updates set `updated_at` in the same atomic step.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _schema: PhantomData<fn() -> T>,
}

impl<T: Schema> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _schema: PhantomData,
        }
    }

    pub async fn insert(&self, mut document: T) -> Result<T, AppError> {
        document.stamp_created(now_ts());
        document.validate()?;

        let id = self
            .store
            .insert_one(T::COLLECTION, to_document(&document)?)
            .await?;
        document.set_id(id);
        Ok(document)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>, AppError> {
        self.find_one(doc! { "_id": id }).await
    }

    /// Like `find_by_id`, but a missing document is an error.
    pub async fn get(&self, id: ObjectId) -> Result<T, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", T::COLLECTION, id.to_hex())))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, AppError> {
        match self.store.find_one(T::COLLECTION, filter).await? {
            Some(raw) => Ok(Some(from_document(raw)?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, filter: Document) -> Result<Vec<T>, AppError> {
        let raw = self.store.find(T::COLLECTION, filter).await?;
        let mut documents = Vec::with_capacity(raw.len());
        for document in raw {
            match from_document::<T>(document) {
                Ok(decoded) => documents.push(decoded),
                Err(e) => log::warn!("⚠️  Skipping undecodable {} document: {}", T::COLLECTION, e),
            }
        }
        Ok(documents)
    }

    /// Atomic in-place update of the first document matching `filter`.
    /// Also sets `updated_at`. Callers validate the change beforehand;
    /// `None` means nothing matched.
    pub async fn update(&self, filter: Document, mut update: Document) -> Result<Option<T>, AppError> {
        let now = now_ts();
        match update.get_document_mut("$set") {
            Ok(set) => {
                set.insert("updated_at", now);
            }
            Err(_) => {
                update.insert("$set", doc! { "updated_at": now });
            }
        }

        match self.store.update_one(T::COLLECTION, filter, update).await? {
            Some(raw) => Ok(Some(from_document(raw)?)),
            None => Ok(None),
        }
    }

    /// Writes only the named top-level fields of an already modified
    /// document, leaving concurrent changes to the other fields intact.
    pub async fn save_fields(&self, document: T, fields: &[&str]) -> Result<T, AppError> {
        let id = document
            .id()
            .ok_or_else(|| AppError::InvalidId(format!("{} document has no _id", T::COLLECTION)))?;
        document.validate()?;

        let raw = to_document(&document)?;
        let mut set = Document::new();
        let mut unset = Document::new();
        for field in fields {
            match raw.get(*field) {
                Some(value) => {
                    set.insert(*field, value.clone());
                }
                None => {
                    unset.insert(*field, "");
                }
            }
        }

        let mut update = doc! { "$set": set };
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        self.update(doc! { "_id": id }, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", T::COLLECTION, id.to_hex())))
    }

    pub async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        Ok(self.store.delete_one(T::COLLECTION, id).await?)
    }

    pub async fn explain(&self, filter: Document) -> Result<QueryPlan, AppError> {
        Ok(self.store.explain(T::COLLECTION, filter).await?)
    }
}

pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{CreateStoryRequest, Story};

    async fn repo() -> Repository<Story> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        store
            .ensure_indexes(Story::COLLECTION, &Story::indexes())
            .await
            .unwrap();
        Repository::new(store)
    }

    fn story(title: &str) -> Story {
        Story::try_from(CreateStoryRequest {
            author_id: "u1".into(),
            title: title.into(),
            content: "content".into(),
            career_stage: "early".into(),
            visibility: None,
            tags: vec![],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let repo = repo().await;
        let saved = repo.insert(story("hello")).await.unwrap();

        let id = saved.id.unwrap();
        assert!(saved.created_at > 0);
        assert_eq!(saved.created_at, saved.updated_at);

        let loaded = repo.get(id).await.unwrap();
        assert_eq!(loaded.title, "hello");
    }

    #[tokio::test]
    async fn invalid_document_is_never_written() {
        let repo = repo().await;
        let err = repo.insert(story("   ")).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ref e) if e.has_field("title")));
        assert!(repo.find(doc! {}).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_fields_requires_existing_document() {
        let repo = repo().await;
        let mut orphan = story("orphan");
        orphan.id = Some(ObjectId::new());

        assert!(matches!(repo.save_fields(orphan, &["title"]).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            repo.save_fields(story("no id"), &["title"]).await,
            Err(AppError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn save_fields_keeps_other_fields_written_meanwhile() {
        let repo = repo().await;
        let saved = repo.insert(story("hello")).await.unwrap();
        let id = saved.id.unwrap();

        // Another request likes the story after this copy was loaded
        repo.update(doc! { "_id": id }, doc! { "$addToSet": { "likes": "u9" } })
            .await
            .unwrap()
            .unwrap();

        let mut stale = saved;
        stale.title = "renamed".into();
        let stored = repo.save_fields(stale, &["title"]).await.unwrap();

        assert_eq!(stored.title, "renamed");
        assert_eq!(stored.likes, vec!["u9".to_string()]);
    }

    #[tokio::test]
    async fn update_on_missing_document_is_none() {
        let repo = repo().await;
        let result = repo
            .update(doc! { "_id": ObjectId::new() }, doc! { "$push": { "tags": "x" } })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn bad_object_id_is_rejected() {
        assert!(matches!(parse_object_id("123"), Err(AppError::InvalidId(_))));
        assert!(parse_object_id("65f1c0ffee0000000000beef").is_ok());
    }
}
