use crate::domain::{NewSubscriber, SubscriberData};
use crate::email_client::{EmailClient, EmailError};
use crate::rate_limit::SubscribeRateLimiter;
use crate::render;
use crate::repository;
use crate::routes::SubscriberError;
use crate::startup::{ApplicationBaseUrl, ConfirmRedirectUrl};
use crate::token::UnsubscribeKey;
use crate::utils::generate_token;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{HttpRequest, HttpResponse, web};
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Public double-opt-in signup. The subscriber is stored unverified with a
/// fresh single-use token and receives a confirmation email; nothing is
/// send-eligible until the token is redeemed.
#[tracing::instrument(
    skip(request, payload, pool, email_client, rate_limiter, base_url),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    request: HttpRequest,
    payload: web::Json<SubscriberData>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    rate_limiter: web::Data<SubscribeRateLimiter>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, SubscriberError> {
    {
        let connection = request.connection_info();
        let client = connection.realip_remote_addr().unwrap_or("unknown");
        if !rate_limiter.try_acquire(client) {
            tracing::warn!(client, "Rejecting a rate-limited subscribe request");
            return Err(SubscriberError::RateLimited);
        }
    }

    let new_subscriber: NewSubscriber = payload
        .into_inner()
        .try_into()
        .map_err(SubscriberError::ValidationError)?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&new_subscriber.email),
    );

    let verification_token = generate_token();
    let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

    repository::store_pending_subscription(&new_subscriber, &verification_token, expires_at, &pool)
        .await?;

    send_confirmation_email(
        &email_client,
        &new_subscriber,
        &base_url.0,
        &verification_token,
    )
    .await
    .context("Failed to send a confirmation email")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

#[tracing::instrument(skip_all)]
async fn send_confirmation_email(
    email_client: &EmailClient,
    subscriber: &NewSubscriber,
    base_url: &str,
    verification_token: &str,
) -> Result<(), EmailError> {
    let confirmation_link =
        format!("{base_url}/v1/subscribers/subscribe/verify?token={verification_token}");
    let html = render::render_confirmation_email_html(subscriber.name.as_ref(), &confirmation_link);

    email_client
        .send_email(&subscriber.email, "Confirm your subscription", &html)
        .await
}

#[derive(Deserialize, Debug)]
pub struct VerifyQuery {
    token: Option<String>,
}

/// Lands from the confirmation email, so failures render HTML rather than
/// the JSON error body. Unknown, redeemed and expired tokens all get the
/// same generic failure page.
#[tracing::instrument(skip_all)]
pub async fn verify_subscription(
    query: web::Query<VerifyQuery>,
    pool: web::Data<PgPool>,
    confirm_redirect: web::Data<ConfirmRedirectUrl>,
) -> Result<HttpResponse, SubscriberError> {
    let token = query
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| SubscriberError::ValidationError("Missing token".to_string()))?;

    match repository::redeem_verification_token(token, &pool).await? {
        None => Ok(html_response(
            StatusCode::BAD_REQUEST,
            render::confirmation_failed_page(),
        )),
        Some(subscriber) => {
            tracing::info!(subscriber_email = %subscriber.email, "Subscription verified");

            match &confirm_redirect.0 {
                Some(url) => Ok(HttpResponse::Found()
                    .insert_header((LOCATION, url.as_str()))
                    .finish()),
                None => Ok(html_response(
                    StatusCode::OK,
                    render::subscription_confirmed_page(),
                )),
            }
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UnsubscribeQuery {
    id: Option<String>,
    token: Option<String>,
}

/// One-click unsubscribe from the newsletter footer. Every outcome is a
/// styled HTML page; the link is opened in a browser, not by an API client.
#[tracing::instrument(skip_all)]
pub async fn unsubscribe(
    query: web::Query<UnsubscribeQuery>,
    pool: web::Data<PgPool>,
    unsubscribe_key: web::Data<UnsubscribeKey>,
) -> Result<HttpResponse, SubscriberError> {
    let (id, token) = match (query.id.as_deref(), query.token.as_deref()) {
        (Some(id), Some(token)) if !id.is_empty() && !token.is_empty() => (id, token),
        _ => {
            return Ok(html_response(
                StatusCode::BAD_REQUEST,
                render::invalid_unsubscribe_link_page(),
            ));
        }
    };

    let Ok(subscriber_id) = Uuid::parse_str(id) else {
        return Ok(html_response(
            StatusCode::BAD_REQUEST,
            render::invalid_unsubscribe_link_page(),
        ));
    };

    let Some(subscriber) = repository::get_subscriber(subscriber_id, &pool).await? else {
        return Ok(html_response(
            StatusCode::NOT_FOUND,
            render::unknown_subscriber_page(),
        ));
    };

    if !unsubscribe_key.verify(subscriber.id, &subscriber.email, token) {
        return Ok(html_response(
            StatusCode::FORBIDDEN,
            render::invalid_unsubscribe_token_page(),
        ));
    }

    match repository::delete_subscriber(subscriber.id, &pool).await {
        Ok(()) => {}
        // Lost a race with another unsubscribe click; the outcome stands.
        Err(SubscriberError::NotFound) => {}
        Err(e) => return Err(e),
    }
    tracing::info!(subscriber_email = %subscriber.email, "Subscriber removed via unsubscribe link");

    Ok(html_response(StatusCode::OK, render::unsubscribed_page()))
}

fn html_response(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}
