use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::Span;
use uuid::Uuid;

use crate::domain::{
    NewsletterDraft, NewsletterRecord, NewsletterResponse, StatusAction,
};
use crate::routes::NewsletterError;

const NEWSLETTER_COLUMNS: &str = "id, project_name, title, month, hero_image_url, \
    intro_prompt, intro_content, sections, signoff_prompt, signoff_content, \
    status, scheduled_at, sent_at, created_at, updated_at";

fn into_response(record: NewsletterRecord) -> Result<NewsletterResponse, NewsletterError> {
    NewsletterResponse::try_from(record)
        .map_err(|e| NewsletterError::UnexpectedError(anyhow::anyhow!(e)))
}

#[tracing::instrument(skip(pool))]
pub async fn get_all_newsletters(pool: &PgPool) -> Result<Vec<NewsletterResponse>, NewsletterError> {
    let records = sqlx::query_as::<_, NewsletterRecord>(&format!(
        "SELECT {NEWSLETTER_COLUMNS} FROM newsletters ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch newsletters")?;

    records.into_iter().map(into_response).collect()
}

pub async fn get_newsletter_record(
    id: Uuid,
    pool: &PgPool,
) -> Result<NewsletterRecord, NewsletterError> {
    let record = sqlx::query_as::<_, NewsletterRecord>(&format!(
        "SELECT {NEWSLETTER_COLUMNS} FROM newsletters WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch newsletter")?;

    record.ok_or(NewsletterError::NotFound)
}

pub async fn get_newsletter(id: Uuid, pool: &PgPool) -> Result<NewsletterResponse, NewsletterError> {
    into_response(get_newsletter_record(id, pool).await?)
}

#[tracing::instrument(
    skip_all,
    fields(newsletter_id=tracing::field::Empty)
)]
pub async fn insert_newsletter(
    draft: &NewsletterDraft,
    pool: &PgPool,
) -> Result<NewsletterResponse, NewsletterError> {
    let record = sqlx::query_as::<_, NewsletterRecord>(&format!(
        r#"
        INSERT INTO newsletters (
            id, project_name, title, month, hero_image_url,
            intro_prompt, intro_content, sections, signoff_prompt, signoff_content
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {NEWSLETTER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(draft.project_name.as_ref())
    .bind(draft.title.as_ref())
    .bind(draft.month.as_deref())
    .bind(draft.hero_image_url.as_deref())
    .bind(draft.intro_prompt.as_deref())
    .bind(draft.intro_content.as_deref())
    .bind(Json(&draft.sections))
    .bind(draft.signoff_prompt.as_deref())
    .bind(draft.signoff_content.as_deref())
    .fetch_one(pool)
    .await
    .context("Failed to insert new newsletter")?;

    Span::current().record("newsletter_id", tracing::field::display(&record.id));

    into_response(record)
}

/// Full replace of a newsletter's content. Lifecycle columns (`status`,
/// `scheduled_at`, `sent_at`) are never written here.
#[tracing::instrument(skip(draft, pool), fields(newsletter_id=%id))]
pub async fn update_newsletter(
    id: Uuid,
    draft: &NewsletterDraft,
    pool: &PgPool,
) -> Result<NewsletterResponse, NewsletterError> {
    let record = sqlx::query_as::<_, NewsletterRecord>(&format!(
        r#"
        UPDATE newsletters
        SET project_name = $1,
            title = $2,
            month = $3,
            hero_image_url = $4,
            intro_prompt = $5,
            intro_content = $6,
            sections = $7,
            signoff_prompt = $8,
            signoff_content = $9,
            updated_at = NOW()
        WHERE id = $10
        RETURNING {NEWSLETTER_COLUMNS}
        "#
    ))
    .bind(draft.project_name.as_ref())
    .bind(draft.title.as_ref())
    .bind(draft.month.as_deref())
    .bind(draft.hero_image_url.as_deref())
    .bind(draft.intro_prompt.as_deref())
    .bind(draft.intro_content.as_deref())
    .bind(Json(&draft.sections))
    .bind(draft.signoff_prompt.as_deref())
    .bind(draft.signoff_content.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to update newsletter")?;

    match record {
        Some(record) => into_response(record),
        None => Err(NewsletterError::NotFound),
    }
}

#[tracing::instrument(skip(pool))]
pub async fn delete_newsletter(id: Uuid, pool: &PgPool) -> Result<Uuid, NewsletterError> {
    let deleted = sqlx::query_scalar::<_, Uuid>(
        r#"
        DELETE FROM newsletters
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to delete newsletter")?;

    deleted.ok_or(NewsletterError::NotFound)
}

/// Clone a newsletter's content into a fresh draft with a "(Copy)" name.
///
/// Existing copies are counted so repeated duplication yields
/// "(Copy)", "(Copy 2)", "(Copy 3)" and so on.
#[tracing::instrument(skip(pool))]
pub async fn duplicate_newsletter(
    id: Uuid,
    pool: &PgPool,
) -> Result<NewsletterResponse, NewsletterError> {
    let original = get_newsletter_record(id, pool).await?;

    let copy_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM newsletters WHERE project_name LIKE $1
        "#,
    )
    .bind(format!("{} (Copy%", original.project_name))
    .fetch_one(pool)
    .await
    .context("Failed to count existing copies")?;

    let copy_name = if copy_count > 0 {
        format!("{} (Copy {})", original.project_name, copy_count + 1)
    } else {
        format!("{} (Copy)", original.project_name)
    };

    let record = sqlx::query_as::<_, NewsletterRecord>(&format!(
        r#"
        INSERT INTO newsletters (
            id, project_name, title, month, hero_image_url,
            intro_prompt, intro_content, sections, signoff_prompt, signoff_content,
            status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'draft')
        RETURNING {NEWSLETTER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&copy_name)
    .bind(&original.title)
    .bind(original.month.as_deref())
    .bind(original.hero_image_url.as_deref())
    .bind(original.intro_prompt.as_deref())
    .bind(original.intro_content.as_deref())
    .bind(Json(&original.sections.0))
    .bind(original.signoff_prompt.as_deref())
    .bind(original.signoff_content.as_deref())
    .fetch_one(pool)
    .await
    .context("Failed to insert duplicated newsletter")?;

    into_response(record)
}

/// Drive the lifecycle state machine one step.
///
/// The current status is read first so the transition table can rule on the
/// (state, action) pair, then the update is compare-and-swapped against that
/// same status. A concurrent transition makes the swap miss and surfaces as
/// a conflict rather than silently overwriting it.
#[tracing::instrument(skip(pool))]
pub async fn transition_newsletter(
    id: Uuid,
    action: StatusAction,
    scheduled_for: Option<DateTime<Utc>>,
    pool: &PgPool,
) -> Result<NewsletterResponse, NewsletterError> {
    let current = get_newsletter_record(id, pool).await?;
    let current_status = current
        .status()
        .map_err(|e| NewsletterError::UnexpectedError(anyhow::anyhow!(e)))?;
    let next_status = current_status
        .apply(action)
        .map_err(NewsletterError::Conflict)?;

    let query = match action {
        StatusAction::Schedule => sqlx::query_as::<_, NewsletterRecord>(&format!(
            r#"
            UPDATE newsletters
            SET status = $1, scheduled_at = $2, updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING {NEWSLETTER_COLUMNS}
            "#
        ))
        .bind(next_status.as_str())
        .bind(scheduled_for)
        .bind(id)
        .bind(current_status.as_str())
        .fetch_optional(pool)
        .await,
        StatusAction::MarkSent => sqlx::query_as::<_, NewsletterRecord>(&format!(
            r#"
            UPDATE newsletters
            SET status = $1, scheduled_at = NULL, sent_at = NOW(), updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {NEWSLETTER_COLUMNS}
            "#
        ))
        .bind(next_status.as_str())
        .bind(id)
        .bind(current_status.as_str())
        .fetch_optional(pool)
        .await,
        StatusAction::Approve | StatusAction::Unschedule => {
            sqlx::query_as::<_, NewsletterRecord>(&format!(
                r#"
                UPDATE newsletters
                SET status = $1, scheduled_at = NULL, updated_at = NOW()
                WHERE id = $2 AND status = $3
                RETURNING {NEWSLETTER_COLUMNS}
                "#
            ))
            .bind(next_status.as_str())
            .bind(id)
            .bind(current_status.as_str())
            .fetch_optional(pool)
            .await
        }
    };

    let record = query.context("Failed to update newsletter status")?;

    match record {
        Some(record) => into_response(record),
        None => Err(NewsletterError::Conflict(
            "the newsletter's status changed concurrently; fetch it and retry".into(),
        )),
    }
}

/// Scheduled newsletters whose send time has passed, oldest first.
#[tracing::instrument(skip(pool))]
pub async fn get_due_newsletters(pool: &PgPool) -> Result<Vec<NewsletterRecord>, anyhow::Error> {
    let records = sqlx::query_as::<_, NewsletterRecord>(&format!(
        r#"
        SELECT {NEWSLETTER_COLUMNS}
        FROM newsletters
        WHERE status = 'scheduled' AND scheduled_at <= NOW()
        ORDER BY scheduled_at ASC
        "#
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch due newsletters")?;

    Ok(records)
}
