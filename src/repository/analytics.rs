use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Counters for one newsletter, folded from per-event-type rows. Unknown
/// event types in storage are skipped rather than failing the report.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCounters {
    pub delivered: i64,
    pub opened: i64,
    pub clicked: i64,
    pub bounced: i64,
    pub complained: i64,
    pub delayed: i64,
    pub unique_opens: i64,
    pub unique_clicks: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClickedUrl {
    pub url: Option<String>,
    pub click_count: i64,
    pub unique_clicks: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentEvent {
    pub event_type: String,
    pub subscriber_email: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Engagement report for a single newsletter. Rates are percentages of
/// delivered count with one decimal, "0.0" when nothing was delivered.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterAnalytics {
    pub stats: DeliveryCounters,
    pub open_rate: String,
    pub click_rate: String,
    pub clicked_urls: Vec<ClickedUrl>,
    pub recent_events: Vec<RecentEvent>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventTotal {
    pub event_type: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterPerformance {
    pub id: Uuid,
    pub title: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered: i64,
    pub unique_opens: i64,
    pub unique_clicks: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub totals: Vec<EventTotal>,
    pub newsletter_stats: Vec<NewsletterPerformance>,
}

#[derive(Debug, sqlx::FromRow)]
struct EventCount {
    event_type: String,
    count: i64,
    unique_count: i64,
}

#[tracing::instrument(skip(payload, pool))]
pub async fn insert_email_event(
    newsletter_id: Option<Uuid>,
    subscriber_email: Option<&str>,
    event_type: &str,
    payload: Option<serde_json::Value>,
    provider_message_id: Option<&str>,
    pool: &PgPool,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        INSERT INTO email_events (id, newsletter_id, subscriber_email, event_type, payload, provider_message_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(newsletter_id)
    .bind(subscriber_email)
    .bind(event_type)
    .bind(payload)
    .bind(provider_message_id)
    .execute(pool)
    .await
    .context("Failed to store email event")?;

    Ok(())
}

#[tracing::instrument(skip(pool))]
pub async fn newsletter_analytics(
    newsletter_id: Uuid,
    pool: &PgPool,
) -> Result<NewsletterAnalytics, anyhow::Error> {
    let event_counts = sqlx::query_as::<_, EventCount>(
        r#"
        SELECT event_type,
               COUNT(*) AS count,
               COUNT(DISTINCT subscriber_email) AS unique_count
        FROM email_events
        WHERE newsletter_id = $1
        GROUP BY event_type
        "#,
    )
    .bind(newsletter_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch event counts")?;

    let mut stats = DeliveryCounters::default();
    for row in &event_counts {
        match row.event_type.as_str() {
            "delivered" => stats.delivered = row.count,
            "opened" => {
                stats.opened = row.count;
                stats.unique_opens = row.unique_count;
            }
            "clicked" => {
                stats.clicked = row.count;
                stats.unique_clicks = row.unique_count;
            }
            "bounced" => stats.bounced = row.count,
            "complained" => stats.complained = row.count,
            "delayed" => stats.delayed = row.count,
            _ => {}
        }
    }

    let clicked_urls = sqlx::query_as::<_, ClickedUrl>(
        r#"
        SELECT payload->>'url' AS url,
               COUNT(*) AS click_count,
               COUNT(DISTINCT subscriber_email) AS unique_clicks
        FROM email_events
        WHERE newsletter_id = $1 AND event_type = 'clicked' AND payload IS NOT NULL
        GROUP BY payload->>'url'
        ORDER BY click_count DESC
        "#,
    )
    .bind(newsletter_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch clicked urls")?;

    let recent_events = sqlx::query_as::<_, RecentEvent>(
        r#"
        SELECT event_type, subscriber_email, payload, created_at
        FROM email_events
        WHERE newsletter_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(newsletter_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent events")?;

    Ok(NewsletterAnalytics {
        open_rate: as_rate(stats.unique_opens, stats.delivered),
        click_rate: as_rate(stats.unique_clicks, stats.delivered),
        stats,
        clicked_urls,
        recent_events,
    })
}

#[tracing::instrument(skip(pool))]
pub async fn overview_analytics(pool: &PgPool) -> Result<AnalyticsOverview, anyhow::Error> {
    let totals = sqlx::query_as::<_, EventTotal>(
        r#"
        SELECT event_type, COUNT(*) AS count
        FROM email_events
        GROUP BY event_type
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch event totals")?;

    let newsletter_stats = sqlx::query_as::<_, NewsletterPerformance>(
        r#"
        SELECT n.id,
               n.title,
               n.sent_at,
               COUNT(CASE WHEN e.event_type = 'delivered' THEN 1 END) AS delivered,
               COUNT(DISTINCT CASE WHEN e.event_type = 'opened' THEN e.subscriber_email END) AS unique_opens,
               COUNT(DISTINCT CASE WHEN e.event_type = 'clicked' THEN e.subscriber_email END) AS unique_clicks
        FROM newsletters n
        LEFT JOIN email_events e ON n.id = e.newsletter_id
        WHERE n.status = 'sent'
        GROUP BY n.id, n.title, n.sent_at
        ORDER BY n.sent_at DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch newsletter performance")?;

    Ok(AnalyticsOverview {
        totals,
        newsletter_stats,
    })
}

fn as_rate(part: i64, whole: i64) -> String {
    if whole > 0 {
        format!("{:.1}", (part as f64 / whole as f64) * 100.0)
    } else {
        "0.0".to_string()
    }
}
