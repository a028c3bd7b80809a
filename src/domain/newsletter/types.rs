use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::{NewsletterDraft, NewsletterStatus, Section};

/// Row shape of the `newsletters` table. Sections live in a JSONB column
/// and deserialize straight into the typed section model.
#[derive(Debug, sqlx::FromRow)]
pub struct NewsletterRecord {
    pub id: Uuid,
    pub project_name: String,
    pub title: String,
    pub month: Option<String>,
    pub hero_image_url: Option<String>,
    pub intro_prompt: Option<String>,
    pub intro_content: Option<String>,
    pub sections: Json<Vec<Section>>,
    pub signoff_prompt: Option<String>,
    pub signoff_content: Option<String>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsletterRecord {
    pub fn status(&self) -> Result<NewsletterStatus, String> {
        NewsletterStatus::parse(&self.status)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterResponse {
    pub id: Uuid,
    pub project_name: String,
    pub title: String,
    pub month: Option<String>,
    pub hero_image_url: Option<String>,
    pub intro_prompt: Option<String>,
    pub intro_content: Option<String>,
    pub sections: Vec<Section>,
    pub signoff_prompt: Option<String>,
    pub signoff_content: Option<String>,
    pub status: NewsletterStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<NewsletterRecord> for NewsletterResponse {
    type Error = String;

    fn try_from(record: NewsletterRecord) -> Result<Self, Self::Error> {
        let status = record.status()?;
        Ok(Self {
            id: record.id,
            project_name: record.project_name,
            title: record.title,
            month: record.month,
            hero_image_url: record.hero_image_url,
            intro_prompt: record.intro_prompt,
            intro_content: record.intro_content,
            sections: record.sections.0,
            signoff_prompt: record.signoff_prompt,
            signoff_content: record.signoff_content,
            status,
            scheduled_at: record.scheduled_at,
            sent_at: record.sent_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Create/update body for a newsletter. Lifecycle fields (`status`,
/// `scheduledAt`, `sentAt`) are deliberately absent: the status machine is
/// only driven through the action endpoints.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterData {
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub intro_prompt: Option<String>,
    #[serde(default)]
    pub intro_content: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub signoff_prompt: Option<String>,
    #[serde(default)]
    pub signoff_content: Option<String>,
}

impl TryFrom<NewsletterData> for NewsletterDraft {
    type Error = String;

    fn try_from(payload: NewsletterData) -> Result<Self, Self::Error> {
        NewsletterDraft::new(
            payload
                .project_name
                .unwrap_or_else(|| "Untitled Project".to_string()),
            payload.title.unwrap_or_else(|| "Untitled".to_string()),
            payload.month,
            payload.hero_image_url,
            payload.intro_prompt,
            payload.intro_content,
            payload.sections.unwrap_or_default(),
            payload.signoff_prompt,
            payload.signoff_content,
        )
    }
}
