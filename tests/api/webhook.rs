use crate::helpers::{TestApp, spawn_app};
use serde_json::{Value, json};
use uuid::Uuid;

type StoredEvent = (
    Option<Uuid>,
    Option<String>,
    String,
    Option<Value>,
    Option<String>,
);

async fn fetch_events(app: &TestApp) -> Vec<StoredEvent> {
    sqlx::query_as(
        "SELECT newsletter_id, subscriber_email, event_type, payload, provider_message_id \
         FROM email_events ORDER BY created_at",
    )
    .fetch_all(&app.db_pool)
    .await
    .expect("Failed to fetch stored events")
}

#[tokio::test]
async fn a_delivered_event_is_recorded_against_its_newsletter() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let newsletter_id = created["id"].as_str().unwrap();

    let response = app
        .send_post(
            "v1/webhooks/email",
            &json!({
                "type": "email.delivered",
                "data": {
                    "to": "reader@example.com",
                    "email_id": "msg-1",
                    "tags": { "newsletter_id": newsletter_id, "type": "newsletter" }
                }
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["received"], true);

    let events = fetch_events(&app).await;
    assert_eq!(events.len(), 1);
    let (stored_id, email, event_type, payload, message_id) = &events[0];
    assert_eq!(*stored_id, Some(Uuid::parse_str(newsletter_id).unwrap()));
    assert_eq!(email.as_deref(), Some("reader@example.com"));
    assert_eq!(event_type, "delivered");
    assert!(payload.is_none());
    assert_eq!(message_id.as_deref(), Some("msg-1"));
}

#[tokio::test]
async fn a_clicked_event_keeps_the_clicked_link() {
    let app = spawn_app().await;

    app.send_post(
        "v1/webhooks/email",
        &json!({
            "type": "email.clicked",
            "data": {
                "to": "reader@example.com",
                "click": { "link": "https://blog.example/parser" }
            }
        }),
    )
    .await
    .error_for_status()
    .unwrap();

    let events = fetch_events(&app).await;
    assert_eq!(events[0].2, "clicked");
    assert_eq!(
        events[0].3,
        Some(json!({ "url": "https://blog.example/parser" }))
    );
}

#[tokio::test]
async fn a_bounced_event_keeps_the_bounce_details() {
    let app = spawn_app().await;

    app.send_post(
        "v1/webhooks/email",
        &json!({
            "type": "email.bounced",
            "data": {
                "to": "gone@example.com",
                "bounce": { "type": "hard", "message": "mailbox unavailable" }
            }
        }),
    )
    .await
    .error_for_status()
    .unwrap();

    let events = fetch_events(&app).await;
    assert_eq!(events[0].2, "bounced");
    assert_eq!(
        events[0].3,
        Some(json!({ "bounceType": "hard", "bounceMessage": "mailbox unavailable" }))
    );
}

#[tokio::test]
async fn an_unrecognized_event_type_is_acknowledged_and_dropped() {
    let app = spawn_app().await;

    let response = app
        .send_post(
            "v1/webhooks/email",
            &json!({ "type": "contact.created", "data": { "id": "abc" } }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["received"], true);
    assert!(fetch_events(&app).await.is_empty());
}

#[tokio::test]
async fn a_recipient_list_is_reduced_to_its_first_address() {
    let app = spawn_app().await;

    app.send_post(
        "v1/webhooks/email",
        &json!({
            "type": "email.opened",
            "data": { "to": ["reader@example.com", "cc@example.com"] }
        }),
    )
    .await
    .error_for_status()
    .unwrap();

    let events = fetch_events(&app).await;
    assert_eq!(events[0].1.as_deref(), Some("reader@example.com"));
}

#[tokio::test]
async fn a_payload_without_type_or_data_is_rejected() {
    let app = spawn_app().await;

    for payload in [
        json!({}),
        json!({ "type": "email.delivered" }),
        json!({ "data": { "to": "reader@example.com" } }),
        json!({ "type": "email.delivered", "data": "not-an-object" }),
    ] {
        let response = app.send_post("v1/webhooks/email", &payload).await;

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Invalid webhook payload");
    }
}

#[tokio::test]
async fn an_unparseable_newsletter_tag_is_stored_without_attribution() {
    let app = spawn_app().await;

    app.send_post(
        "v1/webhooks/email",
        &json!({
            "type": "email.delivered",
            "data": {
                "to": "reader@example.com",
                "tags": { "newsletter_id": "not-a-uuid" }
            }
        }),
    )
    .await
    .error_for_status()
    .unwrap();

    let events = fetch_events(&app).await;
    assert_eq!(events.len(), 1);
    assert!(events[0].0.is_none());
}

#[tokio::test]
async fn events_for_a_deleted_newsletter_are_still_accepted() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let newsletter_id = created["id"].as_str().unwrap().to_string();
    app.send_delete(&format!("v1/newsletters/{newsletter_id}"))
        .await
        .error_for_status()
        .unwrap();

    let response = app
        .send_post(
            "v1/webhooks/email",
            &json!({
                "type": "email.delivered",
                "data": {
                    "to": "reader@example.com",
                    "tags": { "newsletter_id": newsletter_id }
                }
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let events = fetch_events(&app).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, Some(Uuid::parse_str(&newsletter_id).unwrap()));
}
