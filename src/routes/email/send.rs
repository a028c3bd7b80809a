use crate::delivery;
use crate::domain::{StatusAction, SubscriberEmail};
use crate::email_client::{EmailClient, EmailError};
use crate::repository;
use crate::routes::NewsletterError;
use crate::startup::ApplicationBaseUrl;
use crate::token::UnsubscribeKey;
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum SendError {
    #[error("{0}")]
    ValidationError(String),

    #[error("newsletter not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("the email provider rejected the send: {0}")]
    Provider(#[from] EmailError),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SendError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            SendError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SendError::NotFound => StatusCode::NOT_FOUND,
            SendError::Conflict(_) => StatusCode::CONFLICT,
            SendError::Provider(_) => StatusCode::BAD_GATEWAY,
            SendError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

impl From<NewsletterError> for SendError {
    fn from(e: NewsletterError) -> Self {
        match e {
            NewsletterError::ValidationError(message) => SendError::ValidationError(message),
            NewsletterError::NotFound => SendError::NotFound,
            NewsletterError::Conflict(message) => SendError::Conflict(message),
            NewsletterError::UnexpectedError(e) => SendError::UnexpectedError(e),
        }
    }
}

/// The exact HTML a subscriber would receive, rendered for a placeholder
/// recipient. Served as a document so the editor can drop it in an iframe.
#[tracing::instrument(skip(pool, unsubscribe_key, base_url))]
pub async fn preview_newsletter_email(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    unsubscribe_key: web::Data<UnsubscribeKey>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, SendError> {
    let newsletter = repository::get_newsletter_record(id.into_inner(), &pool).await?;

    let html = delivery::render_preview(&newsletter, &unsubscribe_key, &base_url.0);

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(html))
}

#[derive(Deserialize, Debug)]
pub struct TestEmailData {
    email: Option<String>,
}

#[tracing::instrument(skip(payload, pool, email_client, unsubscribe_key, base_url))]
pub async fn send_test_newsletter(
    id: web::Path<Uuid>,
    payload: web::Json<TestEmailData>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    unsubscribe_key: web::Data<UnsubscribeKey>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, SendError> {
    let email = payload
        .into_inner()
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| SendError::ValidationError("Email address is required".to_string()))?;
    let recipient = SubscriberEmail::parse(email).map_err(SendError::ValidationError)?;

    let newsletter = repository::get_newsletter_record(id.into_inner(), &pool).await?;

    delivery::send_test_email(
        &newsletter,
        &recipient,
        &email_client,
        &unsubscribe_key,
        &base_url.0,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Test email sent to {recipient}")
    })))
}

/// Broadcast to every verified subscriber, right now.
///
/// The status check runs before any provider traffic so a draft or
/// already-sent newsletter is rejected without sending a single email. The
/// final transition is the same compare-and-set as the action endpoints; if
/// a concurrent request sent the newsletter first, this one reports a
/// conflict after its own fan-out.
#[tracing::instrument(skip(pool, email_client, unsubscribe_key, base_url))]
pub async fn send_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    unsubscribe_key: web::Data<UnsubscribeKey>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, SendError> {
    let id = id.into_inner();
    let newsletter = repository::get_newsletter_record(id, &pool).await?;

    let status = newsletter
        .status()
        .map_err(|e| SendError::UnexpectedError(anyhow::anyhow!(e)))?;
    status
        .apply(StatusAction::MarkSent)
        .map_err(SendError::Conflict)?;

    let subscribers = repository::get_verified_subscribers(&pool).await?;
    if subscribers.is_empty() {
        return Err(SendError::ValidationError(
            "No verified subscribers found".to_string(),
        ));
    }

    let report = delivery::send_newsletter_to_subscribers(
        &newsletter,
        &subscribers,
        &email_client,
        &unsubscribe_key,
        &base_url.0,
    )
    .await;

    repository::transition_newsletter(id, StatusAction::MarkSent, None, &pool).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Newsletter sent to {} subscribers", report.successful),
        "total": report.total,
        "successful": report.successful,
        "failed": report.failed
    })))
}
