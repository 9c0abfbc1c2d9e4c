use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::planner::plan_query;
use super::store::{DocumentStore, QueryPlan, StoreError};
use crate::models::IndexSpec;

#[derive(Default)]
struct MemoryCollection {
    indexes: Vec<IndexSpec>,
    documents: Vec<Document>,
}

impl MemoryCollection {
    fn position(&self, id: &ObjectId) -> Option<usize> {
        self.documents
            .iter()
            .position(|d| d.get_object_id("_id").ok() == Some(*id))
    }

    /// Rejects `candidate` if it collides with another document on any
    /// unique index.
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        exclude: Option<&ObjectId>,
    ) -> Result<(), StoreError> {
        for index in self.indexes.iter().filter(|i| i.unique) {
            let Some(key) = index_key(index, candidate) else {
                continue;
            };
            let collides = self
                .documents
                .iter()
                .filter(|d| exclude.is_none() || d.get_object_id("_id").ok().as_ref() != exclude)
                .any(|d| index_key(index, d).as_ref() == Some(&key));
            if collides {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: index.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// In-process document store used for local development and tests.
///
/// Enforces unique and sparse indexes and plans queries the same way the
/// MongoDB backend is expected to; it does not persist anything.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, MemoryCollection>>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, MemoryCollection>>, StoreError> {
        self.collections
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let mut collections = self.write()?;
        let coll = collections.entry(collection.to_string()).or_default();
        for index in indexes {
            match coll.indexes.iter_mut().find(|i| i.name == index.name) {
                Some(existing) => *existing = index.clone(),
                None => coll.indexes.push(index.clone()),
            }
        }
        log::debug!("memory store: {} indexes on {}", coll.indexes.len(), collection);
        Ok(())
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<ObjectId, StoreError> {
        let id = match document.get_object_id("_id") {
            Ok(id) => id,
            Err(_) => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut collections = self.write()?;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.position(&id).is_some() {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                index: "_id_".to_string(),
            });
        }
        coll.check_unique(collection, &document, None)?;
        coll.documents.push(document);
        Ok(id)
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.documents
                    .iter()
                    .filter(|d| matches_filter(d, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections.get(collection).and_then(|coll| {
            coll.documents
                .iter()
                .find(|d| matches_filter(d, &filter))
                .cloned()
        }))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.write()?;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = coll.documents.iter().position(|d| matches_filter(d, &filter)) else {
            return Ok(None);
        };

        let mut updated = coll.documents[pos].clone();
        apply_update(&mut updated, &update)?;

        let id = updated.get_object_id("_id").ok();
        coll.check_unique(collection, &updated, id.as_ref())?;
        coll.documents[pos] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match coll.position(&id) {
            Some(pos) => {
                coll.documents.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn explain(&self, collection: &str, filter: Document) -> Result<QueryPlan, StoreError> {
        let collections = self.read()?;
        let indexes = collections
            .get(collection)
            .map(|c| c.indexes.as_slice())
            .unwrap_or(&[]);
        Ok(plan_query(collection, indexes, &filter))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

/// All values reachable at a dotted path, descending through arrays of
/// subdocuments.
fn values_at<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let Some(value) = document.get(head) else {
        return Vec::new();
    };

    match (rest, value) {
        (None, value) => vec![value],
        (Some(rest), Bson::Document(inner)) => values_at(inner, rest),
        (Some(rest), Bson::Array(items)) => match positional(rest) {
            Some((index, tail)) => match (items.get(index), tail) {
                (Some(item), None) => vec![item],
                (Some(Bson::Document(inner)), Some(tail)) => values_at(inner, tail),
                _ => Vec::new(),
            },
            None => items
                .iter()
                .filter_map(|item| match item {
                    Bson::Document(inner) => Some(values_at(inner, rest)),
                    _ => None,
                })
                .flatten()
                .collect(),
        },
        _ => Vec::new(),
    }
}

/// Splits a leading array position off a path: `"2.user_id"` -> `(2, Some("user_id"))`.
fn positional(path: &str) -> Option<(usize, Option<&str>)> {
    let (head, tail) = match path.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    };
    head.parse().ok().map(|index| (index, tail))
}

fn value_matches(value: &Bson, expected: &Bson) -> bool {
    if value == expected {
        return true;
    }
    match value {
        Bson::Array(items) => items.iter().any(|item| item == expected),
        _ => false,
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| {
        let values = values_at(document, path);
        if let Bson::Document(operator) = expected {
            if let Some(excluded) = operator.get("$ne") {
                return !values.iter().any(|v| value_matches(v, excluded));
            }
        }
        if *expected == Bson::Null {
            return values.is_empty() || values.iter().any(|v| **v == Bson::Null);
        }
        values.iter().any(|v| value_matches(v, expected))
    })
}

// ==================== UPDATES ====================

fn unsupported(message: String) -> StoreError {
    StoreError::Database(format!("memory store: {}", message))
}

/// Walks to the parent of the last path segment, creating missing
/// subdocuments. Numeric segments index into arrays.
fn slot_at<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Bson, StoreError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    if !document.contains_key(head) {
        let fresh = match rest {
            Some(_) => Bson::Document(Document::new()),
            None => Bson::Null,
        };
        document.insert(head, fresh);
    }
    let slot = document
        .get_mut(head)
        .ok_or_else(|| unsupported(format!("missing field {}", head)))?;

    match rest {
        None => Ok(slot),
        Some(rest) => slot_in(slot, rest),
    }
}

fn slot_in<'a>(value: &'a mut Bson, path: &str) -> Result<&'a mut Bson, StoreError> {
    match value {
        Bson::Document(inner) => slot_at(inner, path),
        Bson::Array(items) => {
            let (head, rest) = match path.split_once('.') {
                Some((head, rest)) => (head, Some(rest)),
                None => (path, None),
            };
            let index: usize = head
                .parse()
                .map_err(|_| unsupported(format!("'{}' is not an array position", head)))?;
            let item = items
                .get_mut(index)
                .ok_or_else(|| unsupported(format!("array position {} does not exist", index)))?;
            match rest {
                None => Ok(item),
                Some(rest) => slot_in(item, rest),
            }
        }
        _ => Err(unsupported(format!("cannot descend into scalar at {}", path))),
    }
}

fn array_at<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Vec<Bson>, StoreError> {
    let slot = slot_at(document, path)?;
    if *slot == Bson::Null {
        *slot = Bson::Array(Vec::new());
    }
    match slot {
        Bson::Array(items) => Ok(items),
        _ => Err(unsupported(format!("{} is not an array", path))),
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), StoreError> {
    for (operator, fields) in update {
        let fields = match fields {
            Bson::Document(fields) => fields,
            _ => return Err(unsupported(format!("{} expects a document", operator))),
        };
        for (path, value) in fields {
            match operator.as_str() {
                "$set" => *slot_at(document, path)? = value.clone(),
                "$push" => array_at(document, path)?.push(value.clone()),
                "$addToSet" => {
                    let items = array_at(document, path)?;
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
                "$unset" => unset_path(document, path),
                other => return Err(unsupported(format!("update operator {} is not supported", other))),
            }
        }
    }
    Ok(())
}

/// Index key of a document. `None` when a sparse index skips it.
fn index_key(index: &IndexSpec, document: &Document) -> Option<Vec<Bson>> {
    let key: Vec<Bson> = index
        .fields()
        .map(|field| {
            values_at(document, field)
                .first()
                .map(|v| (*v).clone())
                .unwrap_or(Bson::Null)
        })
        .collect();

    if index.sparse && key.iter().all(|v| *v == Bson::Null) {
        None
    } else {
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn user_indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["email"]).unique(),
            IndexSpec::ascending(&["microsoft_id"]).unique().sparse(),
        ]
    }

    #[tokio::test]
    async fn unique_index_rejects_second_insert() {
        let store = MemoryStore::new();
        store.ensure_indexes("users", &user_indexes()).await.unwrap();

        store.insert_one("users", doc! { "email": "a@x.com" }).await.unwrap();
        let err = store
            .insert_one("users", doc! { "email": "a@x.com" })
            .await
            .unwrap_err();

        match err {
            StoreError::DuplicateKey { index, .. } => assert_eq!(index, "email_1"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn sparse_unique_index_ignores_missing_values() {
        let store = MemoryStore::new();
        store.ensure_indexes("users", &user_indexes()).await.unwrap();

        store.insert_one("users", doc! { "email": "a@x.com" }).await.unwrap();
        store.insert_one("users", doc! { "email": "b@x.com" }).await.unwrap();
        store
            .insert_one("users", doc! { "email": "c@x.com", "microsoft_id": "ms-1" })
            .await
            .unwrap();

        let err = store
            .insert_one("users", doc! { "email": "d@x.com", "microsoft_id": "ms-1" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref index, .. } if index == "microsoft_id_1"));
    }

    #[tokio::test]
    async fn update_checks_uniqueness_against_other_documents_only() {
        let store = MemoryStore::new();
        store.ensure_indexes("users", &user_indexes()).await.unwrap();

        let a = store.insert_one("users", doc! { "email": "a@x.com", "n": 1 }).await.unwrap();
        store.insert_one("users", doc! { "email": "b@x.com" }).await.unwrap();

        let same_email = store
            .update_one("users", doc! { "_id": a }, doc! { "$set": { "email": "a@x.com", "n": 2 } })
            .await
            .unwrap();
        assert_eq!(same_email.unwrap().get_i32("n").unwrap(), 2);

        let err = store
            .update_one("users", doc! { "_id": a }, doc! { "$set": { "email": "b@x.com" } })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        let stored = store.find_one("users", doc! { "_id": a }).await.unwrap().unwrap();
        assert_eq!(stored.get_str("email").unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn filters_match_dotted_paths_and_arrays() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "projects",
                doc! {
                    "title": "p1",
                    "tags": ["rust", "cloud"],
                    "participants": [ { "user_id": "u1" }, { "user_id": "u2" } ],
                },
            )
            .await
            .unwrap();
        store
            .insert_one("projects", doc! { "title": "p2", "tags": ["go"] })
            .await
            .unwrap();

        let by_tag = store.find("projects", doc! { "tags": "rust" }).await.unwrap();
        assert_eq!(by_tag.len(), 1);

        let by_participant = store
            .find("projects", doc! { "participants.user_id": "u2" })
            .await
            .unwrap();
        assert_eq!(by_participant[0].get_str("title").unwrap(), "p1");

        let second = doc! { "participants.1.user_id": "u2" };
        assert_eq!(store.find("projects", second).await.unwrap().len(), 1);
        let wrong_slot = doc! { "participants.0.user_id": "u2" };
        assert!(store.find("projects", wrong_slot).await.unwrap().is_empty());
        let past_end = doc! { "tags.5": "rust" };
        assert!(store.find("projects", past_end).await.unwrap().is_empty());

        assert!(store
            .find_one("projects", doc! { "title": "p3" })
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_operators_modify_arrays_in_place() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(
                "mentorships",
                doc! { "likes": ["u1"], "sessions": [ { "completed": false } ] },
            )
            .await
            .unwrap();

        let updated = store
            .update_one(
                "mentorships",
                doc! { "_id": id },
                doc! {
                    "$addToSet": { "likes": "u1" },
                    "$push": { "progress": { "milestone": "m" } },
                    "$set": { "sessions.0.completed": true, "feedback.mentor_rating": 5 },
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_array("likes").unwrap().len(), 1);
        assert_eq!(updated.get_array("progress").unwrap().len(), 1);
        let session = updated.get_array("sessions").unwrap()[0].as_document().unwrap().clone();
        assert!(session.get_bool("completed").unwrap());
        assert_eq!(updated.get_document("feedback").unwrap().get_i32("mentor_rating").unwrap(), 5);

        let stored = store.find_one("mentorships", doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn update_with_ne_filter_skips_matching_documents() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("projects", doc! { "participants": [ { "user_id": "u1" } ] })
            .await
            .unwrap();

        let filter = |user: &str| doc! { "_id": id, "participants.user_id": { "$ne": user } };
        let push = |user: &str| doc! { "$push": { "participants": { "user_id": user } } };

        assert!(store.update_one("projects", filter("u1"), push("u1")).await.unwrap().is_none());
        assert!(store.update_one("projects", filter("u2"), push("u2")).await.unwrap().is_some());
        assert!(store
            .update_one("projects", doc! { "_id": ObjectId::new() }, push("u3"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_rejects_missing_array_position_without_writing() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("mentorships", doc! { "sessions": [], "n": 1 })
            .await
            .unwrap();

        let result = store
            .update_one(
                "mentorships",
                doc! { "_id": id },
                doc! { "$set": { "n": 2, "sessions.3.completed": true } },
            )
            .await;
        assert!(result.is_err());

        let stored = store.find_one("mentorships", doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(stored.get_i32("n").unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = MemoryStore::new();
        let id = store.insert_one("stories", doc! { "title": "t" }).await.unwrap();

        assert!(store.delete_one("stories", id).await.unwrap());
        assert!(!store.delete_one("stories", id).await.unwrap());
        assert!(store.find("stories", doc! {}).await.unwrap().is_empty());
    }
}
