use crate::helpers::newsletter::sample_newsletter_payload;
use crate::helpers::spawn_app;
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn create_with_an_empty_payload_returns_a_named_draft() {
    let app = spawn_app().await;

    let response = app.create_newsletter(&json!({})).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["projectName"], "Untitled Project");
    assert_eq!(body["title"], "Untitled");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["sections"], json!([]));
    assert!(body["scheduledAt"].is_null());
    assert!(body["sentAt"].is_null());
}

#[tokio::test]
async fn create_rejects_a_blank_title() {
    let app = spawn_app().await;

    let response = app.create_newsletter(&json!({ "title": "   " })).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn create_rejects_an_unknown_section_name() {
    let app = spawn_app().await;

    let response = app
        .create_newsletter(&json!({
            "sections": [{ "name": "Sponsored Posts", "items": [] }]
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn list_returns_newsletters_newest_first() {
    let app = spawn_app().await;
    app.create_newsletter(&json!({ "title": "First" }))
        .await
        .error_for_status()
        .unwrap();
    app.create_newsletter(&json!({ "title": "Second" }))
        .await
        .error_for_status()
        .unwrap();

    let response = app.send_get("v1/newsletters").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn get_returns_404_for_an_unknown_id() {
    let app = spawn_app().await;

    let response = app.get_newsletter(&Uuid::new_v4().to_string()).await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn sections_round_trip_unchanged_through_put_and_get() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    // Ordering is deliberate: items are not sorted by the server, and
    // omitted optional fields must stay omitted.
    let sections = json!([
        {
            "name": "Folks to follow",
            "items": [
                { "url": "https://social.example/b", "title": "B" },
                { "url": "https://social.example/a", "title": "A", "author": "A. Author" }
            ]
        },
        {
            "name": "Blogs & Projects",
            "items": [
                {
                    "url": "https://blog.example/z",
                    "title": "Z",
                    "blurb": "A blurb.",
                    "imageUrl": "data:image/png;base64,AAAA"
                }
            ]
        },
        { "name": "Technology was a mistake", "items": [] }
    ]);

    let response = app
        .send_put(
            &format!("v1/newsletters/{id}"),
            &json!({ "title": "Edited", "sections": sections }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let fetched: Value = app.get_newsletter(id).await.json().await.unwrap();
    assert_eq!(fetched["sections"], sections);
    assert_eq!(fetched["title"], "Edited");
}

#[tokio::test]
async fn put_replaces_content_without_touching_the_status() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();

    let response = app
        .send_put(
            &format!("v1/newsletters/{id}"),
            &json!({ "title": "Still approved after this edit" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "approved");
    assert_eq!(app.newsletter_status(id).await, "approved");
}

#[tokio::test]
async fn put_returns_404_for_an_unknown_id() {
    let app = spawn_app().await;

    let response = app
        .send_put(
            &format!("v1/newsletters/{}", Uuid::new_v4()),
            &json!({ "title": "Ghost" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_removes_the_newsletter() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app.send_delete(&format!("v1/newsletters/{id}")).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], created["id"]);

    assert_eq!(app.get_newsletter(id).await.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_returns_404_for_an_unknown_id() {
    let app = spawn_app().await;

    let response = app
        .send_delete(&format!("v1/newsletters/{}", Uuid::new_v4()))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_clones_content_into_a_fresh_draft() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();

    let response = app
        .send_post(&format!("v1/newsletters/{id}/duplicate"), &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let copy: Value = response.json().await.unwrap();
    assert_ne!(copy["id"], approved["id"]);
    assert_eq!(copy["projectName"], "Devtools Digest (Copy)");
    assert_eq!(copy["title"], approved["title"]);
    assert_eq!(copy["sections"], approved["sections"]);
    // The copy starts its own lifecycle regardless of the original's state
    assert_eq!(copy["status"], "draft");
}

#[tokio::test]
async fn repeated_duplication_numbers_the_copies() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let first: Value = app
        .send_post(&format!("v1/newsletters/{id}/duplicate"), &json!({}))
        .await
        .json()
        .await
        .unwrap();
    let second: Value = app
        .send_post(&format!("v1/newsletters/{id}/duplicate"), &json!({}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["projectName"], "Devtools Digest (Copy)");
    assert_eq!(second["projectName"], "Devtools Digest (Copy 2)");
}

#[tokio::test]
async fn approve_moves_a_draft_to_approved() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app.approve_newsletter(id).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn approving_twice_is_an_idempotent_200() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();

    let response = app.approve_newsletter(id).await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.newsletter_status(id).await, "approved");
}

#[tokio::test]
async fn scheduling_a_draft_returns_409() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app.schedule_newsletter(id, "2031-01-01T09:00:00Z").await;

    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.newsletter_status(id).await, "draft");
}

#[tokio::test]
async fn scheduling_an_approved_newsletter_stores_the_time() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();

    let response = app.schedule_newsletter(id, "2031-01-01T09:00:00Z").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["scheduledAt"], "2031-01-01T09:00:00Z");
}

#[tokio::test]
async fn scheduling_in_the_past_returns_400_and_changes_nothing() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();

    let response = app.schedule_newsletter(id, "2019-01-01T09:00:00Z").await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "The scheduled time must be in the future.");
    assert_eq!(app.newsletter_status(id).await, "approved");
}

#[tokio::test]
async fn rescheduling_replaces_the_scheduled_time() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();
    app.schedule_newsletter(id, "2031-01-01T09:00:00Z")
        .await
        .error_for_status()
        .unwrap();

    let response = app.schedule_newsletter(id, "2032-06-15T18:30:00Z").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["scheduledAt"], "2032-06-15T18:30:00Z");
}

#[tokio::test]
async fn unschedule_returns_the_newsletter_to_approved() {
    let app = spawn_app().await;
    let approved = app.create_approved_newsletter().await;
    let id = approved["id"].as_str().unwrap();
    app.schedule_newsletter(id, "2031-01-01T09:00:00Z")
        .await
        .error_for_status()
        .unwrap();

    let response = app
        .send_post(&format!("v1/newsletters/{id}/unschedule"), &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "approved");
    assert!(body["scheduledAt"].is_null());
}

#[tokio::test]
async fn unscheduling_a_draft_returns_409() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .send_post(&format!("v1/newsletters/{id}/unschedule"), &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn lifecycle_actions_return_404_for_an_unknown_id() {
    let app = spawn_app().await;
    let ghost = Uuid::new_v4().to_string();

    assert_eq!(app.approve_newsletter(&ghost).await.status().as_u16(), 404);
    assert_eq!(
        app.schedule_newsletter(&ghost, "2031-01-01T09:00:00Z")
            .await
            .status()
            .as_u16(),
        404
    );
}

#[tokio::test]
async fn error_responses_carry_code_and_message() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app.schedule_newsletter(id, "2031-01-01T09:00:00Z").await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 409);
    assert_eq!(
        body["message"],
        "a draft newsletter cannot be scheduled; approve it first"
    );
}

#[tokio::test]
async fn defaults_fill_in_for_omitted_fields_on_put() {
    let app = spawn_app().await;
    let created = app.create_sample_newsletter().await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .send_put(&format!("v1/newsletters/{id}"), &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["projectName"], "Untitled Project");
    assert_eq!(body["title"], "Untitled");
    assert_eq!(body["sections"], json!([]));
}

#[tokio::test]
async fn created_sections_match_the_submitted_payload() {
    let app = spawn_app().await;

    let payload = sample_newsletter_payload();
    let response = app.create_newsletter(&payload).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sections"], payload["sections"]);
}
