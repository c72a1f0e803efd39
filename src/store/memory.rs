//! Volatile in-process adapter, used as fallback backend and by tests.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::Mutex;

use super::{DocumentStore, Record, Result, StoreError, normalize, to_document};

/// One collection kept in memory.
pub struct MemoryStore {
    primary_key: String,
    documents: Mutex<Vec<Document>>,
}

impl MemoryStore {
    /// Create an empty collection exposing the store id as `primary_key`.
    pub fn new(primary_key: &str) -> Self {
        Self {
            primary_key: primary_key.to_owned(),
            documents: Mutex::new(Vec::new()),
        }
    }

    fn matches(document: &Document, criteria: &Document) -> bool {
        criteria
            .iter()
            .all(|(key, value)| document.get(key) == Some(value))
    }

    fn has_id(document: &Document, id: ObjectId) -> bool {
        document.get("_id") == Some(&Bson::ObjectId(id))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Record>> {
        let documents = self.documents.lock().await;

        documents
            .iter()
            .cloned()
            .map(|document| normalize(document, &self.primary_key))
            .collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let documents = self.documents.lock().await;

        documents
            .iter()
            .find(|document| Self::has_id(document, id))
            .cloned()
            .map(|document| normalize(document, &self.primary_key))
            .transpose()
    }

    async fn create(&self, payload: Record) -> Result<Record> {
        let mut document = to_document(&payload);
        document.insert("_id", ObjectId::new());

        let mut documents = self.documents.lock().await;
        documents.push(document.clone());

        normalize(document, &self.primary_key)
    }

    async fn update(&self, id: &str, patch: Record) -> Result<Record> {
        let oid = ObjectId::parse_str(id).map_err(|_| StoreError::NotFound)?;

        let mut documents = self.documents.lock().await;
        let document = documents
            .iter_mut()
            .find(|document| Self::has_id(document, oid))
            .ok_or(StoreError::NotFound)?;

        for (key, value) in to_document(&patch) {
            document.insert(key, value);
        }

        normalize(document.clone(), &self.primary_key)
    }

    async fn delete(&self, id: &str) -> Result<String> {
        if let Ok(oid) = ObjectId::parse_str(id) {
            let mut documents = self.documents.lock().await;
            documents.retain(|document| !Self::has_id(document, oid));
        }

        Ok(id.to_owned())
    }

    async fn find_by(&self, criteria: Record) -> Result<Vec<Record>> {
        let criteria = to_document(&criteria);
        let documents = self.documents.lock().await;

        documents
            .iter()
            .filter(|document| Self::matches(document, &criteria))
            .cloned()
            .map(|document| normalize(document, &self.primary_key))
            .collect()
    }

    async fn find_one_by(&self, criteria: Record) -> Result<Option<Record>> {
        Ok(self.find_by(criteria).await?.into_iter().next())
    }
}
