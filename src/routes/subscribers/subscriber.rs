use crate::domain::{NewSubscriber, SubscriberData};
use crate::repository;
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum SubscriberError {
    #[error("{0}")]
    ValidationError(String),

    #[error("subscriber not found")]
    NotFound,

    #[error("Too many requests, please try again later.")]
    RateLimited,

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscriberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscriberError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            SubscriberError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscriberError::NotFound => StatusCode::NOT_FOUND,
            SubscriberError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SubscriberError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn list_subscribers(pool: web::Data<PgPool>) -> Result<HttpResponse, SubscriberError> {
    let subscribers = repository::get_all_subscribers(&pool).await?;

    Ok(HttpResponse::Ok().json(subscribers))
}

/// Admin insert. The subscriber is created unverified and receives no
/// verification email; the public subscribe endpoint handles opt-in.
#[tracing::instrument(skip(payload, pool))]
pub async fn create_subscriber(
    payload: web::Json<SubscriberData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscriberError> {
    let subscriber: NewSubscriber = payload
        .into_inner()
        .try_into()
        .map_err(SubscriberError::ValidationError)?;

    let stored = repository::upsert_subscriber(&subscriber, &pool).await?;

    Ok(HttpResponse::Ok().json(stored))
}

#[tracing::instrument(skip(payload, pool))]
pub async fn edit_subscriber(
    id: web::Path<Uuid>,
    payload: web::Json<SubscriberData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscriberError> {
    let subscriber: NewSubscriber = payload
        .into_inner()
        .try_into()
        .map_err(SubscriberError::ValidationError)?;

    let stored = repository::update_subscriber(id.into_inner(), &subscriber, &pool).await?;

    Ok(HttpResponse::Ok().json(stored))
}

#[tracing::instrument(skip(pool))]
pub async fn delete_subscriber(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscriberError> {
    repository::delete_subscriber(id.into_inner(), &pool).await?;

    Ok(HttpResponse::NoContent().finish())
}
