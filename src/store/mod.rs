//! Generic access layer over named collections of a schemaless document
//! store.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::{DEFAULT_ADDRESS, DEFAULT_DATABASE, MongoStore, connect};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use serde::ser::Error as _;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single schemaless record, keyed by field name.
pub type Record = Map<String, Value>;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by document store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("database error: {0}")]
    Backend(#[from] mongodb::error::Error),
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Typed operations over one collection of a backing document database.
///
/// Implementations are bound at construction to the collection they serve
/// and to the field name under which the store id is exposed. Every record
/// leaving an adapter is normalized: the store id becomes a hex string under
/// the primary-key field and native datetime values become RFC 3339 strings.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every record of the collection.
    async fn get_all(&self) -> Result<Vec<Record>>;

    /// Fetch one record by primary key. `None` when absent, including ids
    /// that are not well-formed.
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>>;

    /// Insert a record, then read it back with its generated id.
    async fn create(&self, payload: Record) -> Result<Record>;

    /// Merge fields into an existing record. Fails with
    /// [`StoreError::NotFound`] when the id is unknown.
    async fn update(&self, id: &str, patch: Record) -> Result<Record>;

    /// Remove a record. Returns the id whether or not it existed.
    async fn delete(&self, id: &str) -> Result<String>;

    /// Equality conjunction over all supplied fields.
    async fn find_by(&self, criteria: Record) -> Result<Vec<Record>>;

    /// First match of [`DocumentStore::find_by`], if any.
    async fn find_one_by(&self, criteria: Record) -> Result<Option<Record>>;
}

/// Serialize a typed payload into a [`Record`].
pub fn record_from(value: impl serde::Serialize) -> serde_json::Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        _ => Err(serde_json::Error::custom("payload must be an object")),
    }
}

/// Convert a [`Record`] into a BSON document, field by field.
fn to_document(record: &Record) -> Document {
    let mut document = Document::new();
    for (key, value) in record {
        document.insert(key.clone(), to_bson(value));
    }

    document
}

fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(boolean) => Bson::Boolean(*boolean),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Bson::Int64(integer),
            None => Bson::Double(number.as_f64().unwrap_or_default()),
        },
        Value::String(string) => Bson::String(string.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Object(map) => Bson::Document(to_document(map)),
    }
}

/// Flatten a stored document into a [`Record`]. The store id lands first
/// under `primary_key`; a stored field with the same name wins over it.
fn normalize(mut document: Document, primary_key: &str) -> Result<Record> {
    let mut record = Record::new();
    if let Some(id) = document.remove("_id") {
        record.insert(primary_key.to_owned(), from_bson(id)?);
    }

    for (key, value) in document {
        record.insert(key, from_bson(value)?);
    }

    Ok(record)
}

fn from_bson(value: Bson) -> Result<Value> {
    Ok(match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => Value::String(
            date.try_to_rfc3339_string()
                .map_err(|err| StoreError::Malformed(err.to_string()))?,
        ),
        Bson::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_bson)
                .collect::<Result<Vec<_>>>()?,
        ),
        Bson::Document(document) => {
            let mut map = Record::new();
            for (key, value) in document {
                map.insert(key, from_bson(value)?);
            }

            Value::Object(map)
        },
        other => other.into_relaxed_extjson(),
    })
}
