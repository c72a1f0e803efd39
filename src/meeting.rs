//! Meeting rooms, the second tenant of the document store.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::store::{DocumentStore, Record, record_from};

const ROOM_ID_LENGTH: usize = 8;
const DEFAULT_TITLE: &str = "Meeting";

/// Meeting as saved on the document store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub host_id: String,
    pub title: String,
    /// Public join code, distinct from the store id.
    pub room_id: String,
    /// RFC 3339.
    pub created_at: String,
    pub participants: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub meta: Record,
}

/// Insert payload for [`Meeting`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeetingDraft {
    host_id: String,
    title: String,
    room_id: String,
    created_at: String,
    participants: Vec<String>,
    is_active: bool,
    meta: Record,
}

/// Meeting manager over the `meetings` collection.
#[derive(Clone)]
pub struct MeetingService {
    store: Arc<dyn DocumentStore>,
}

impl MeetingService {
    /// Create a new [`MeetingService`].
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a room with a fresh public join code.
    pub async fn create(
        &self,
        host_id: &str,
        title: Option<String>,
        participants: Vec<String>,
    ) -> Result<Meeting> {
        let draft = MeetingDraft {
            host_id: host_id.to_owned(),
            title: title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            room_id: Alphanumeric.sample_string(&mut OsRng, ROOM_ID_LENGTH),
            created_at: Utc::now().to_rfc3339(),
            participants,
            is_active: true,
            meta: Record::new(),
        };

        let record = self.store.create(record_from(draft)?).await?;
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Fetch a room by its public join code. `None` when absent.
    pub async fn find_by_room_id(&self, room_id: &str) -> Result<Option<Meeting>> {
        let mut criteria = Record::new();
        criteria.insert("roomId".to_owned(), Value::String(room_id.to_owned()));

        Ok(self
            .store
            .find_one_by(criteria)
            .await?
            .map(|record| serde_json::from_value(Value::Object(record)))
            .transpose()?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::store::MemoryStore;

    fn service() -> MeetingService {
        MeetingService::new(Arc::new(MemoryStore::new("id")))
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let service = service();

        let meeting = service.create("host-1", None, Vec::new()).await.unwrap();

        assert_eq!(meeting.id.len(), 24);
        assert_eq!(meeting.host_id, "host-1");
        assert_eq!(meeting.title, DEFAULT_TITLE);
        assert_eq!(meeting.room_id.len(), ROOM_ID_LENGTH);
        assert!(meeting.room_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(meeting.participants.is_empty());
        assert!(meeting.is_active);
        assert!(meeting.meta.is_empty());
        assert!(DateTime::parse_from_rfc3339(&meeting.created_at).is_ok());
    }

    #[tokio::test]
    async fn test_create_keeps_given_fields() {
        let service = service();

        let meeting = service
            .create(
                "host-1",
                Some("Standup".to_owned()),
                vec!["a".to_owned(), "b".to_owned()],
            )
            .await
            .unwrap();

        assert_eq!(meeting.title, "Standup");
        assert_eq!(meeting.participants, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_title_falls_back() {
        let service = service();

        let meeting = service
            .create("host-1", Some(String::new()), Vec::new())
            .await
            .unwrap();

        assert_eq!(meeting.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_find_by_room_id() {
        let service = service();

        let created = service.create("host-1", None, Vec::new()).await.unwrap();

        let found = service
            .find_by_room_id(&created.room_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);

        assert!(
            service
                .find_by_room_id("missing1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_room_ids_are_distinct() {
        let service = service();

        let first = service.create("host-1", None, Vec::new()).await.unwrap();
        let second = service.create("host-1", None, Vec::new()).await.unwrap();

        assert_ne!(first.room_id, second.room_id);
    }
}
