//! MongoDB adapter.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, Database};

use super::{DocumentStore, Record, Result, StoreError, normalize, to_document};

pub const DEFAULT_ADDRESS: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "agorax";

/// Open a connection and select the database holding all collections.
pub async fn connect(address: &str, database: &str) -> Result<Database> {
    let client = Client::with_uri_str(address).await?;

    Ok(client.database(database))
}

/// Adapter over one MongoDB collection.
#[derive(Clone)]
pub struct MongoStore {
    primary_key: String,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Bind the adapter to `collection`, exposing the store id as
    /// `primary_key`.
    pub fn new(database: &Database, collection: &str, primary_key: &str) -> Self {
        Self {
            primary_key: primary_key.to_owned(),
            collection: database.collection(collection),
        }
    }

    async fn collect(&self, filter: Document) -> Result<Vec<Record>> {
        let mut cursor = self.collection.find(filter).await?;
        let mut records = Vec::new();
        while cursor.advance().await? {
            records.push(normalize(cursor.deserialize_current()?, &self.primary_key)?);
        }

        Ok(records)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn get_all(&self) -> Result<Vec<Record>> {
        self.collect(Document::new()).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let document = self.collection.find_one(doc! { "_id": id }).await?;

        document
            .map(|document| normalize(document, &self.primary_key))
            .transpose()
    }

    async fn create(&self, payload: Record) -> Result<Record> {
        let inserted = self.collection.insert_one(to_document(&payload)).await?;

        // Read back so generated fields reach the caller.
        let document = self
            .collection
            .find_one(doc! { "_id": inserted.inserted_id })
            .await?
            .ok_or(StoreError::NotFound)?;

        normalize(document, &self.primary_key)
    }

    async fn update(&self, id: &str, patch: Record) -> Result<Record> {
        let oid = ObjectId::parse_str(id).map_err(|_| StoreError::NotFound)?;

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": to_document(&patch) })
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }

        let document = self
            .collection
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or(StoreError::NotFound)?;

        normalize(document, &self.primary_key)
    }

    async fn delete(&self, id: &str) -> Result<String> {
        if let Ok(oid) = ObjectId::parse_str(id) {
            self.collection.delete_one(doc! { "_id": oid }).await?;
        }

        Ok(id.to_owned())
    }

    async fn find_by(&self, criteria: Record) -> Result<Vec<Record>> {
        self.collect(to_document(&criteria)).await
    }

    async fn find_one_by(&self, criteria: Record) -> Result<Option<Record>> {
        let document = self.collection.find_one(to_document(&criteria)).await?;

        document
            .map(|document| normalize(document, &self.primary_key))
            .transpose()
    }
}
