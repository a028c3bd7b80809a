use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::Span;
use uuid::Uuid;

use crate::domain::{NewSubscriber, SubscriberRecord, SubscriberResponse};
use crate::routes::SubscriberError;

const SUBSCRIBER_COLUMNS: &str =
    "id, email, name, verification_token, verification_expires_at, verified_at, created_at";

#[tracing::instrument(skip(pool))]
pub async fn get_all_subscribers(pool: &PgPool) -> Result<Vec<SubscriberResponse>, SubscriberError> {
    let records = sqlx::query_as::<_, SubscriberRecord>(&format!(
        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch subscribers")?;

    Ok(records.into_iter().map(SubscriberResponse::from).collect())
}

pub async fn get_subscriber(
    id: Uuid,
    pool: &PgPool,
) -> Result<Option<SubscriberRecord>, anyhow::Error> {
    sqlx::query_as::<_, SubscriberRecord>(&format!(
        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch subscriber")
}

/// Subscribers eligible to receive a newsletter.
pub async fn get_verified_subscribers(
    pool: &PgPool,
) -> Result<Vec<SubscriberRecord>, anyhow::Error> {
    sqlx::query_as::<_, SubscriberRecord>(&format!(
        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE verified_at IS NOT NULL"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch verified subscribers")
}

/// Admin insert: creates the subscriber outright, or renames an existing one
/// with the same email. Verification state is left alone.
#[tracing::instrument(
    skip_all,
    fields(subscriber_email=%subscriber.email)
)]
pub async fn upsert_subscriber(
    subscriber: &NewSubscriber,
    pool: &PgPool,
) -> Result<SubscriberResponse, SubscriberError> {
    let record = sqlx::query_as::<_, SubscriberRecord>(&format!(
        r#"
        INSERT INTO subscribers (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING {SUBSCRIBER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(subscriber.email.as_ref())
    .bind(subscriber.name.as_ref())
    .fetch_one(pool)
    .await
    .context("Failed to upsert subscriber")?;

    Ok(SubscriberResponse::from(record))
}

/// Public signup: store (or refresh) a pending subscription with a fresh
/// verification token.
///
/// A repeat signup for a known email resets `verified_at`, so the address
/// must be confirmed again before it receives anything.
#[tracing::instrument(
    skip_all,
    fields(subscriber_email=%subscriber.email, subscriber_id=tracing::field::Empty)
)]
pub async fn store_pending_subscription(
    subscriber: &NewSubscriber,
    verification_token: &str,
    expires_at: DateTime<Utc>,
    pool: &PgPool,
) -> Result<SubscriberRecord, SubscriberError> {
    let record = sqlx::query_as::<_, SubscriberRecord>(&format!(
        r#"
        INSERT INTO subscribers (id, email, name, verification_token, verification_expires_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET
            name = EXCLUDED.name,
            verification_token = EXCLUDED.verification_token,
            verification_expires_at = EXCLUDED.verification_expires_at,
            verified_at = NULL
        RETURNING {SUBSCRIBER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(subscriber.email.as_ref())
    .bind(subscriber.name.as_ref())
    .bind(verification_token)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .context("Failed to store pending subscription")?;

    Span::current().record("subscriber_id", tracing::field::display(&record.id));

    Ok(record)
}

/// Atomically redeem a verification token: marks the subscriber verified and
/// burns the token in the same statement.
///
/// `None` means the token is unknown, already redeemed, or expired; the three
/// cases are indistinguishable on purpose.
#[tracing::instrument(skip_all)]
pub async fn redeem_verification_token(
    token: &str,
    pool: &PgPool,
) -> Result<Option<SubscriberRecord>, anyhow::Error> {
    sqlx::query_as::<_, SubscriberRecord>(&format!(
        r#"
        UPDATE subscribers
        SET verified_at = NOW(),
            verification_token = NULL,
            verification_expires_at = NULL
        WHERE verification_token = $1
          AND verification_expires_at > NOW()
        RETURNING {SUBSCRIBER_COLUMNS}
        "#
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to redeem verification token")
}

#[tracing::instrument(skip(subscriber, pool), fields(subscriber_id=%id))]
pub async fn update_subscriber(
    id: Uuid,
    subscriber: &NewSubscriber,
    pool: &PgPool,
) -> Result<SubscriberResponse, SubscriberError> {
    let record = sqlx::query_as::<_, SubscriberRecord>(&format!(
        r#"
        UPDATE subscribers
        SET email = $1, name = $2
        WHERE id = $3
        RETURNING {SUBSCRIBER_COLUMNS}
        "#
    ))
    .bind(subscriber.email.as_ref())
    .bind(subscriber.name.as_ref())
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to update subscriber")?;

    match record {
        Some(record) => Ok(SubscriberResponse::from(record)),
        None => Err(SubscriberError::NotFound),
    }
}

#[tracing::instrument(skip(pool))]
pub async fn delete_subscriber(id: Uuid, pool: &PgPool) -> Result<(), SubscriberError> {
    let result = sqlx::query(
        r#"
        DELETE FROM subscribers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to delete subscriber")?;

    if result.rows_affected() == 0 {
        return Err(SubscriberError::NotFound);
    }

    Ok(())
}
