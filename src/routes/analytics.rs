use crate::repository;
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AnalyticsError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            AnalyticsError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

pub fn analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/newsletters/{id}",
        web::get().to(get_newsletter_analytics),
    )
    .route("/overview", web::get().to(get_analytics_overview));
}

/// Engagement report for one newsletter. An id with no recorded events
/// reports zero counts rather than a not-found error.
#[tracing::instrument(skip(pool))]
pub async fn get_newsletter_analytics(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AnalyticsError> {
    let report = repository::newsletter_analytics(id.into_inner(), &pool).await?;

    Ok(HttpResponse::Ok().json(report))
}

#[tracing::instrument(skip(pool))]
pub async fn get_analytics_overview(
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AnalyticsError> {
    let overview = repository::overview_analytics(&pool).await?;

    Ok(HttpResponse::Ok().json(overview))
}
