//! In-memory document store.
//!
//! Keeps each collection in insertion order, which is the iteration order
//! `find` reports. Upsert replaces the whole document in place. Used by
//! tests and by the scheduler when no database is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use paddock_core::{PaddockResult, StorageError};

use crate::document::{matches_filter, natural_key, Document, Filter, Upsert};
use crate::traits::DocumentStore;

#[derive(Debug, Default)]
struct Collection {
    docs: Vec<Document>,
    index: HashMap<String, usize>,
}

impl Collection {
    fn upsert(&mut self, upsert: Upsert) {
        let key = natural_key(&upsert.filter);
        match self.index.get(&key) {
            Some(&slot) => self.docs[slot] = upsert.document,
            None => {
                self.index.insert(key, self.docs.len());
                self.docs.push(upsert.document);
            }
        }
    }
}

/// In-memory [`DocumentStore`] with fault injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    fail_next_find: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    find_calls: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `find` fail as if the store were unreachable.
    pub fn fail_next_find(&self) {
        self.fail_next_find.store(true, Ordering::SeqCst);
    }

    /// Make every `bulk_upsert` fail until switched off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `find` calls served so far, failed ones included.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> PaddockResult<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections.get(collection).map_or(0, |c| c.docs.len()))
    }

    /// Insert a raw document, bypassing the mapper. Lets tests plant
    /// malformed records.
    pub fn insert_raw(&self, collection: &str, filter: Filter, document: Document) -> PaddockResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .upsert(Upsert::new(filter, document));
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> PaddockResult<Vec<Document>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_find.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected find failure".to_string(),
            }
            .into());
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.docs
                    .iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn bulk_upsert(&self, collection: &str, batch: Vec<Upsert>) -> PaddockResult<u64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                collection: collection.to_string(),
                reason: "injected write failure".to_string(),
            }
            .into());
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let target = collections.entry(collection.to_string()).or_default();
        let affected = batch.len() as u64;
        for upsert in batch {
            target.upsert(upsert);
        }
        Ok(affected)
    }

    async fn ping(&self) -> PaddockResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let store = InMemoryDocumentStore::new();
        let batch = (1..=3)
            .rev()
            .map(|id| {
                Upsert::new(
                    doc(json!({"season": 2024, "round_id": id})),
                    doc(json!({"season": 2024, "round_id": id})),
                )
            })
            .collect();
        store.bulk_upsert("rounds", batch).await.unwrap();

        let found = store
            .find("rounds", &doc(json!({"season": 2024})))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|d| d["round_id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2), json!(1)]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let store = InMemoryDocumentStore::new();
        let key = doc(json!({"year": 2024}));
        let first = vec![Upsert::new(key.clone(), doc(json!({"year": 2024, "rounds": 20})))];
        let second = vec![Upsert::new(key.clone(), doc(json!({"year": 2024, "rounds": 24})))];

        assert_eq!(store.bulk_upsert("seasons", first).await.unwrap(), 1);
        assert_eq!(store.bulk_upsert("seasons", second).await.unwrap(), 1);
        assert_eq!(store.count("seasons").unwrap(), 1);

        let found = store.find("seasons", &key).await.unwrap();
        assert_eq!(found[0]["rounds"], json!(24));
    }

    #[tokio::test]
    async fn test_find_on_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        assert!(store.find("seasons", &Filter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_find();
        assert!(store.find("seasons", &Filter::new()).await.is_err());
        assert!(store.find("seasons", &Filter::new()).await.is_ok());
        assert_eq!(store.find_calls(), 2);

        store.set_fail_writes(true);
        let result = store
            .bulk_upsert("seasons", vec![Upsert::new(Filter::new(), Document::new())])
            .await;
        assert!(result.is_err());
        assert_eq!(store.count("seasons").unwrap(), 0);
    }
}
