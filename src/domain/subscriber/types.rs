use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::NewSubscriber;

/// Row shape of the `subscribers` table.
#[derive(Debug, sqlx::FromRow)]
pub struct SubscriberRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Subscriber shape returned by the admin endpoints. The verification token
/// never leaves the database.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriberRecord> for SubscriberResponse {
    fn from(record: SubscriberRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            verified_at: record.verified_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SubscriberData {
    email: String,
    name: String,
}

impl TryFrom<SubscriberData> for NewSubscriber {
    type Error = String;

    fn try_from(payload: SubscriberData) -> Result<Self, Self::Error> {
        NewSubscriber::new(payload.email, payload.name)
    }
}
