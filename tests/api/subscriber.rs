use crate::helpers::spawn_app;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn subscribe_stores_a_pending_subscriber_and_sends_a_confirmation_email() {
    let app = spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .subscribe(&json!({ "email": "Reader@Example.COM", "name": "Jess Reader" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let (email, verified_at, token, expires_at): (
        String,
        Option<DateTime<Utc>>,
        Option<String>,
        Option<DateTime<Utc>>,
    ) = sqlx::query_as(
        "SELECT email, verified_at, verification_token, verification_expires_at \
         FROM subscribers",
    )
    .fetch_one(&app.db_pool)
    .await
    .expect("Failed to fetch saved subscriber.");

    // Case-normalized at the edge
    assert_eq!(email, "reader@example.com");
    assert!(verified_at.is_none());
    assert!(token.is_some());
    assert!(expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn subscribe_rejects_an_invalid_email_without_sending_anything() {
    let app = spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .subscribe(&json!({ "email": "not-an-email", "name": "Jess" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn subscribe_rejects_a_name_with_forbidden_characters() {
    let app = spawn_app().await;

    let response = app
        .subscribe(&json!({ "email": "reader@example.com", "name": "<script>" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn subscribe_returns_500_when_the_email_provider_is_down() {
    let app = spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .subscribe(&json!({ "email": "reader@example.com", "name": "Jess" }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn clicking_the_confirmation_link_verifies_the_subscriber() {
    let app = spawn_app().await;

    let confirmation_link = app
        .subscribe_and_capture_link("reader@example.com", "Jess")
        .await;
    let response = reqwest::get(confirmation_link).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Thanks for confirming!"));

    let (verified_at, token): (Option<DateTime<Utc>>, Option<String>) = sqlx::query_as(
        "SELECT verified_at, verification_token FROM subscribers WHERE email = $1",
    )
    .bind("reader@example.com")
    .fetch_one(&app.db_pool)
    .await
    .expect("Failed to fetch saved subscriber.");

    assert!(verified_at.is_some());
    // The token is burned on redemption
    assert!(token.is_none());
}

#[tokio::test]
async fn the_confirmation_link_works_only_once() {
    let app = spawn_app().await;

    let confirmation_link = app
        .subscribe_and_capture_link("reader@example.com", "Jess")
        .await;
    reqwest::get(confirmation_link.clone())
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let replay = reqwest::get(confirmation_link).await.unwrap();

    assert_eq!(replay.status().as_u16(), 400);
    assert!(replay.text().await.unwrap().contains("Confirmation Failed"));
}

#[tokio::test]
async fn verify_without_a_token_returns_400() {
    let app = spawn_app().await;

    let response = app.send_get("v1/subscribers/subscribe/verify").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn verify_with_an_unknown_token_returns_the_failure_page() {
    let app = spawn_app().await;

    let response = app
        .send_get("v1/subscribers/subscribe/verify?token=not-a-real-token")
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert!(response.text().await.unwrap().contains("Confirmation Failed"));
}

#[tokio::test]
async fn an_expired_token_fails_and_keeps_failing_on_retry() {
    let app = spawn_app().await;

    let confirmation_link = app
        .subscribe_and_capture_link("reader@example.com", "Jess")
        .await;

    sqlx::query(
        "UPDATE subscribers SET verification_expires_at = NOW() - INTERVAL '1 hour' \
         WHERE email = $1",
    )
    .bind("reader@example.com")
    .execute(&app.db_pool)
    .await
    .unwrap();

    let first = reqwest::get(confirmation_link.clone()).await.unwrap();
    let second = reqwest::get(confirmation_link).await.unwrap();

    // Expired redemption must not consume or alter anything
    assert_eq!(first.status().as_u16(), 400);
    assert_eq!(second.status().as_u16(), 400);

    let verified_at: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT verified_at FROM subscribers WHERE email = $1")
            .bind("reader@example.com")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert!(verified_at.is_none());
}

#[tokio::test]
async fn resubscribing_resets_the_verification_state() {
    let app = spawn_app().await;
    app.create_verified_subscriber("reader@example.com", "Jess")
        .await;

    let fresh_link = app
        .subscribe_and_capture_link("reader@example.com", "Jess Again")
        .await;

    let (name, verified_at): (String, Option<DateTime<Utc>>) =
        sqlx::query_as("SELECT name, verified_at FROM subscribers WHERE email = $1")
            .bind("reader@example.com")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(name, "Jess Again");
    assert!(verified_at.is_none(), "re-subscribing must require a fresh opt-in");

    // The fresh link verifies again
    let response = reqwest::get(fresh_link).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn subscribe_requests_beyond_the_rate_limit_get_a_429() {
    let app = spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    let payload = json!({ "email": "reader@example.com", "name": "Jess" });
    for _ in 0..20 {
        let response = app.subscribe(&payload).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = app.subscribe(&payload).await;

    assert_eq!(response.status().as_u16(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Too many requests, please try again later.");
}

#[tokio::test]
async fn unsubscribe_with_a_valid_token_removes_the_subscriber() {
    let app = spawn_app().await;
    app.create_verified_subscriber("reader@example.com", "Jess")
        .await;
    let id: Uuid = sqlx::query_scalar("SELECT id FROM subscribers WHERE email = $1")
        .bind("reader@example.com")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    let token = app.unsubscribe_key.derive(id, "reader@example.com");

    let response = app
        .send_get(&format!("v1/subscribers/unsubscribe?id={id}&token={token}"))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Successfully Unsubscribed")
    );

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn unsubscribe_with_missing_parameters_returns_400() {
    let app = spawn_app().await;

    let response = app.send_get("v1/subscribers/unsubscribe").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .send_get("v1/subscribers/unsubscribe?id=not-a-uuid&token=abc")
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn unsubscribe_for_an_unknown_subscriber_returns_404() {
    let app = spawn_app().await;

    let response = app
        .send_get(&format!(
            "v1/subscribers/unsubscribe?id={}&token=abc",
            Uuid::new_v4()
        ))
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("Already Unsubscribed"));
}

#[tokio::test]
async fn unsubscribe_with_a_wrong_token_returns_403_and_keeps_the_subscriber() {
    let app = spawn_app().await;
    app.create_verified_subscriber("reader@example.com", "Jess")
        .await;
    let id: Uuid = sqlx::query_scalar("SELECT id FROM subscribers WHERE email = $1")
        .bind("reader@example.com")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();

    let response = app
        .send_get(&format!(
            "v1/subscribers/unsubscribe?id={id}&token=0000deadbeef0000deadbeef0000dead"
        ))
        .await;

    assert_eq!(response.status().as_u16(), 403);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn admin_list_exposes_subscribers_without_verification_tokens() {
    let app = spawn_app().await;
    app.create_verified_subscriber("reader@example.com", "Jess")
        .await;

    let response = app.send_get("v1/subscribers").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let listed = &body.as_array().unwrap()[0];
    assert_eq!(listed["email"], "reader@example.com");
    assert_eq!(listed["name"], "Jess");
    assert!(!listed["verifiedAt"].is_null());
    assert!(listed.get("verificationToken").is_none());
}

#[tokio::test]
async fn admin_create_stores_a_subscriber_without_sending_an_email() {
    let app = spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .send_post(
            "v1/subscribers",
            &json!({ "email": "import@example.com", "name": "Imported" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "import@example.com");
    assert!(body["verifiedAt"].is_null());
}

#[tokio::test]
async fn admin_create_with_a_known_email_renames_in_place() {
    let app = spawn_app().await;

    let first: Value = app
        .send_post(
            "v1/subscribers",
            &json!({ "email": "import@example.com", "name": "Old Name" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let second: Value = app
        .send_post(
            "v1/subscribers",
            &json!({ "email": "import@example.com", "name": "New Name" }),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["name"], "New Name");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn admin_edit_updates_email_and_name() {
    let app = spawn_app().await;
    let created: Value = app
        .send_post(
            "v1/subscribers",
            &json!({ "email": "import@example.com", "name": "Old" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let response = app
        .send_put(
            &format!("v1/subscribers/{id}"),
            &json!({ "email": "renamed@example.com", "name": "New" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "renamed@example.com");
    assert_eq!(body["name"], "New");
}

#[tokio::test]
async fn admin_edit_returns_404_for_an_unknown_id() {
    let app = spawn_app().await;

    let response = app
        .send_put(
            &format!("v1/subscribers/{}", Uuid::new_v4()),
            &json!({ "email": "ghost@example.com", "name": "Ghost" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_delete_removes_the_subscriber() {
    let app = spawn_app().await;
    let created: Value = app
        .send_post(
            "v1/subscribers",
            &json!({ "email": "import@example.com", "name": "Jess" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let response = app.send_delete(&format!("v1/subscribers/{id}")).await;
    assert_eq!(response.status().as_u16(), 204);

    let replay = app.send_delete(&format!("v1/subscribers/{id}")).await;
    assert_eq!(replay.status().as_u16(), 404);
}
