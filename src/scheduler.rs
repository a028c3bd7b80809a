use sqlx::PgPool;
use tokio::time::Duration;

use crate::configuration::Configuration;
use crate::delivery::send_newsletter_to_subscribers;
use crate::domain::{NewsletterRecord, StatusAction};
use crate::email_client::EmailClient;
use crate::repository::{get_due_newsletters, get_verified_subscribers, transition_newsletter};
use crate::startup::get_connection_pool;
use crate::token::UnsubscribeKey;

const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run_scheduler_until_stopped(config: Configuration) -> Result<(), anyhow::Error> {
    let connection_pool = get_connection_pool(&config.database);
    let email_client = config.email_client.client();
    let unsubscribe_key = UnsubscribeKey::new(config.application.unsubscribe_secret);
    let base_url = config.application.base_url;

    scheduler_loop(connection_pool, email_client, unsubscribe_key, base_url).await
}

/// Poll for due newsletters once a minute, starting immediately.
///
/// A failed tick is logged and the next tick runs as normal; whatever was
/// due and unsent is simply picked up again.
async fn scheduler_loop(
    pool: PgPool,
    email_client: EmailClient,
    unsubscribe_key: UnsubscribeKey,
    base_url: String,
) -> Result<(), anyhow::Error> {
    tracing::info!("Scheduler started, checking every minute for scheduled newsletters");

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        // the first tick completes immediately
        ticker.tick().await;
        if let Err(e) = run_due_newsletters(&pool, &email_client, &unsubscribe_key, &base_url).await
        {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Scheduler tick failed",
            );
        }
    }
}

/// One scheduler pass: send every scheduled newsletter whose time has come,
/// oldest schedule first, one at a time.
///
/// Each newsletter is isolated: a failure is logged and the pass moves on to
/// the next one. Returns how many newsletters were dispatched.
#[tracing::instrument(skip_all)]
pub async fn run_due_newsletters(
    pool: &PgPool,
    email_client: &EmailClient,
    unsubscribe_key: &UnsubscribeKey,
    base_url: &str,
) -> Result<usize, anyhow::Error> {
    let due = get_due_newsletters(pool).await?;
    if !due.is_empty() {
        tracing::info!(count = due.len(), "Found newsletters ready to send");
    }

    let mut dispatched = 0;
    for newsletter in due {
        match send_due_newsletter(&newsletter, pool, email_client, unsubscribe_key, base_url).await
        {
            Ok(true) => dispatched += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    newsletter_id = %newsletter.id,
                    "Failed to send a scheduled newsletter. It stays scheduled for the next poll.",
                );
            }
        }
    }

    Ok(dispatched)
}

/// Returns `Ok(false)` when there is nobody to send to: the newsletter is
/// left scheduled so it goes out on a later poll, once someone has verified.
#[tracing::instrument(
    skip_all,
    fields(newsletter_id = %newsletter.id)
)]
async fn send_due_newsletter(
    newsletter: &NewsletterRecord,
    pool: &PgPool,
    email_client: &EmailClient,
    unsubscribe_key: &UnsubscribeKey,
    base_url: &str,
) -> Result<bool, anyhow::Error> {
    let subscribers = get_verified_subscribers(pool).await?;
    if subscribers.is_empty() {
        tracing::info!("No verified subscribers; the newsletter stays scheduled");
        return Ok(false);
    }

    let report = send_newsletter_to_subscribers(
        newsletter,
        &subscribers,
        email_client,
        unsubscribe_key,
        base_url,
    )
    .await;

    transition_newsletter(newsletter.id, StatusAction::MarkSent, None, pool).await?;

    tracing::info!(
        successful = report.successful,
        failed = report.failed,
        "Scheduled newsletter dispatched"
    );

    Ok(true)
}
