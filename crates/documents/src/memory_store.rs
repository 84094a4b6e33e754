use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::*;

/// Document store held in process memory.
///
/// Documents are kept in insertion order. Used for tests and for running the server
/// without a database.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<Vec<(Uuid, Document)>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError> {
        let id = Uuid::new_v4();
        self.docs.write().await.push((id, strip_id(doc)));

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.read().await;

        Ok(docs
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(doc_id, doc)| with_id(doc_id, doc.clone())))
    }

    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;

        Ok(docs
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, doc)| with_id(id, doc.clone()))
            .collect())
    }

    async fn update_by_id(&self, id: &Uuid, fields: Document) -> Result<UpdateResult, StoreError> {
        let mut docs = self.docs.write().await;

        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, doc)) => {
                let modified = merge_into(doc, strip_id(fields));
                Ok(UpdateResult::updated(1, u64::from(modified)))
            }
            None => Ok(UpdateResult::updated(0, 0)),
        }
    }

    async fn upsert_by_key(&self, key: &str, doc: Document) -> Result<UpdateResult, StoreError> {
        let value = key_value(&doc, key)?;
        let doc = strip_id(doc);
        let mut docs = self.docs.write().await;

        let existing = docs.iter_mut().find(|(_, stored)| {
            stored.get(key).and_then(serde_json::Value::as_str) == Some(value.as_str())
        });

        match existing {
            Some((_, stored)) => {
                let modified = merge_into(stored, doc);
                Ok(UpdateResult::updated(1, u64::from(modified)))
            }
            None => {
                let id = Uuid::new_v4();
                docs.push((id, doc));
                Ok(UpdateResult::upserted(id))
            }
        }
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<DeleteResult, StoreError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: (before - docs.len()) as u64,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
