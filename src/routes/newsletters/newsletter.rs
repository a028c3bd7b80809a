use crate::domain::{NewsletterData, NewsletterDraft, StatusAction};
use crate::repository;
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error("{0}")]
    ValidationError(String),

    #[error("newsletter not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for NewsletterError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            NewsletterError::ValidationError(_) => StatusCode::BAD_REQUEST,
            NewsletterError::NotFound => StatusCode::NOT_FOUND,
            NewsletterError::Conflict(_) => StatusCode::CONFLICT,
            NewsletterError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn list_newsletters(pool: web::Data<PgPool>) -> Result<HttpResponse, NewsletterError> {
    let newsletters = repository::get_all_newsletters(&pool).await?;

    Ok(HttpResponse::Ok().json(newsletters))
}

#[tracing::instrument(skip(pool))]
pub async fn get_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let newsletter = repository::get_newsletter(id.into_inner(), &pool).await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(skip(payload, pool))]
pub async fn create_newsletter(
    payload: web::Json<NewsletterData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let draft: NewsletterDraft = payload
        .into_inner()
        .try_into()
        .map_err(NewsletterError::ValidationError)?;

    let newsletter = repository::insert_newsletter(&draft, &pool).await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

/// Replaces the newsletter's content. Lifecycle fields are not part of the
/// payload; a PUT never moves the status machine.
#[tracing::instrument(skip(payload, pool))]
pub async fn edit_newsletter(
    id: web::Path<Uuid>,
    payload: web::Json<NewsletterData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let draft: NewsletterDraft = payload
        .into_inner()
        .try_into()
        .map_err(NewsletterError::ValidationError)?;

    let newsletter = repository::update_newsletter(id.into_inner(), &draft, &pool).await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(skip(pool))]
pub async fn delete_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let deleted_id = repository::delete_newsletter(id.into_inner(), &pool).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "id": deleted_id
    })))
}

#[tracing::instrument(skip(pool))]
pub async fn duplicate_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let copy = repository::duplicate_newsletter(id.into_inner(), &pool).await?;

    Ok(HttpResponse::Ok().json(copy))
}

#[tracing::instrument(skip(pool))]
pub async fn approve_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let newsletter =
        repository::transition_newsletter(id.into_inner(), StatusAction::Approve, None, &pool)
            .await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleData {
    scheduled_at: DateTime<Utc>,
}

#[tracing::instrument(skip(pool), fields(scheduled_at = %payload.scheduled_at))]
pub async fn schedule_newsletter(
    id: web::Path<Uuid>,
    payload: web::Json<ScheduleData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let scheduled_at = payload.scheduled_at;
    if scheduled_at <= Utc::now() {
        return Err(NewsletterError::ValidationError(
            "The scheduled time must be in the future.".to_string(),
        ));
    }

    let newsletter = repository::transition_newsletter(
        id.into_inner(),
        StatusAction::Schedule,
        Some(scheduled_at),
        &pool,
    )
    .await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(skip(pool))]
pub async fn unschedule_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let newsletter =
        repository::transition_newsletter(id.into_inner(), StatusAction::Unschedule, None, &pool)
            .await?;

    Ok(HttpResponse::Ok().json(newsletter))
}
