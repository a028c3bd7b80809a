use crate::helpers::{TestApp, spawn_app};
use serde_json::{Value, json};
use uuid::Uuid;

async fn post_event(app: &TestApp, event_type: &str, data: Value) {
    app.send_post(
        "v1/webhooks/email",
        &json!({ "type": event_type, "data": data }),
    )
    .await
    .error_for_status()
    .unwrap();
}

#[tokio::test]
async fn newsletter_analytics_aggregates_delivery_and_engagement() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();
    let tags = json!({ "newsletter_id": id });

    for email in ["one@example.com", "two@example.com"] {
        post_event(
            &app,
            "email.delivered",
            json!({ "to": email, "tags": tags }),
        )
        .await;
    }
    // One reader opens twice; both readers click the same link.
    for _ in 0..2 {
        post_event(
            &app,
            "email.opened",
            json!({ "to": "one@example.com", "tags": tags }),
        )
        .await;
    }
    for email in ["one@example.com", "two@example.com"] {
        post_event(
            &app,
            "email.clicked",
            json!({
                "to": email,
                "tags": tags,
                "click": { "link": "https://blog.example/parser" }
            }),
        )
        .await;
    }
    post_event(
        &app,
        "email.bounced",
        json!({
            "to": "gone@example.com",
            "tags": tags,
            "bounce": { "type": "hard", "message": "mailbox unavailable" }
        }),
    )
    .await;

    let response = app.send_get(&format!("v1/analytics/newsletters/{id}")).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["stats"],
        json!({
            "delivered": 2,
            "opened": 2,
            "clicked": 2,
            "bounced": 1,
            "complained": 0,
            "delayed": 0,
            "uniqueOpens": 1,
            "uniqueClicks": 2
        })
    );
    assert_eq!(body["openRate"], "50.0");
    assert_eq!(body["clickRate"], "100.0");
    assert_eq!(
        body["clickedUrls"],
        json!([{
            "url": "https://blog.example/parser",
            "clickCount": 2,
            "uniqueClicks": 2
        }])
    );

    let recent = body["recentEvents"].as_array().unwrap();
    assert_eq!(recent.len(), 6);
    // Newest first: the bounce was recorded last
    assert_eq!(recent[0]["eventType"], "bounced");
    assert_eq!(recent[0]["subscriberEmail"], "gone@example.com");
}

#[tokio::test]
async fn analytics_for_an_id_with_no_events_reports_zeroes() {
    let app = spawn_app().await;

    let response = app
        .send_get(&format!("v1/analytics/newsletters/{}", Uuid::new_v4()))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["delivered"], 0);
    assert_eq!(body["stats"]["uniqueOpens"], 0);
    assert_eq!(body["openRate"], "0.0");
    assert_eq!(body["clickRate"], "0.0");
    assert_eq!(body["clickedUrls"], json!([]));
    assert_eq!(body["recentEvents"], json!([]));
}

#[tokio::test]
async fn the_overview_totals_every_event_but_ranks_only_sent_newsletters() {
    let app = spawn_app().await;
    let sent = app.create_sample_newsletter().await;
    let sent_id = sent["id"].as_str().unwrap();
    let draft: Value = app
        .create_newsletter(&json!({ "title": "Still a draft" }))
        .await
        .json()
        .await
        .unwrap();
    let draft_id = draft["id"].as_str().unwrap();
    sqlx::query("UPDATE newsletters SET status = 'sent', sent_at = NOW() WHERE id = $1")
        .bind(Uuid::parse_str(sent_id).unwrap())
        .execute(&app.db_pool)
        .await
        .unwrap();

    post_event(
        &app,
        "email.delivered",
        json!({ "to": "one@example.com", "tags": { "newsletter_id": sent_id } }),
    )
    .await;
    post_event(
        &app,
        "email.opened",
        json!({ "to": "one@example.com", "tags": { "newsletter_id": sent_id } }),
    )
    .await;
    post_event(
        &app,
        "email.delivered",
        json!({ "to": "two@example.com", "tags": { "newsletter_id": draft_id } }),
    )
    .await;
    // No attribution at all
    post_event(&app, "email.delivered", json!({ "to": "three@example.com" })).await;

    let response = app.send_get("v1/analytics/overview").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();

    let totals = body["totals"].as_array().unwrap();
    let total_for = |event_type: &str| {
        totals
            .iter()
            .find(|row| row["eventType"] == event_type)
            .map(|row| row["count"].as_i64().unwrap())
    };
    assert_eq!(total_for("delivered"), Some(3));
    assert_eq!(total_for("opened"), Some(1));

    let rankings = body["newsletterStats"].as_array().unwrap();
    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0]["id"], sent_id);
    assert_eq!(rankings[0]["title"], "Devtools Digest #12");
    assert!(!rankings[0]["sentAt"].is_null());
    assert_eq!(rankings[0]["delivered"], 1);
    assert_eq!(rankings[0]["uniqueOpens"], 1);
    assert_eq!(rankings[0]["uniqueClicks"], 0);
}

#[tokio::test]
async fn an_empty_event_log_yields_an_empty_overview() {
    let app = spawn_app().await;

    let response = app.send_get("v1/analytics/overview").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totals"], json!([]));
    assert_eq!(body["newsletterStats"], json!([]));
}
