use crate::repository;
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum WebhookError {
    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for WebhookError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            WebhookError::ValidationError(_) => StatusCode::BAD_REQUEST,
            WebhookError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

pub fn webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/email", web::post().to(ingest_email_event));
}

/// Ingests delivery events posted by the email provider.
///
/// The body is navigated dynamically: providers add fields without notice
/// and an over-strict schema would bounce events we care about. Unknown
/// event types are acknowledged and dropped so the provider stops
/// retrying them.
#[tracing::instrument(skip_all, fields(event_type = tracing::field::Empty))]
pub async fn ingest_email_event(
    payload: web::Json<Value>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, WebhookError> {
    let event = payload.into_inner();

    let (Some(provider_type), Some(data)) = (
        event.get("type").and_then(Value::as_str),
        event.get("data").filter(|data| data.is_object()),
    ) else {
        return Err(WebhookError::ValidationError(
            "Invalid webhook payload".to_string(),
        ));
    };
    tracing::Span::current().record("event_type", provider_type);

    let Some(event_type) = map_event_type(provider_type) else {
        tracing::info!(provider_type, "Ignoring an unrecognized event type");
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })));
    };

    // Tag values come back exactly as they were attached at send time.
    let newsletter_id = data
        .get("tags")
        .and_then(|tags| tags.get("newsletter_id"))
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok());
    let subscriber_email = data.get("to").and_then(|to| match to {
        Value::String(address) => Some(address.as_str()),
        // Some providers report recipients as a list even for single sends
        Value::Array(addresses) => addresses.first().and_then(Value::as_str),
        _ => None,
    });
    let provider_message_id = data.get("email_id").and_then(Value::as_str);

    repository::insert_email_event(
        newsletter_id,
        subscriber_email,
        event_type,
        event_payload(event_type, data),
        provider_message_id,
        &pool,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })))
}

fn map_event_type(provider_type: &str) -> Option<&'static str> {
    match provider_type {
        "email.delivered" => Some("delivered"),
        "email.opened" => Some("opened"),
        "email.clicked" => Some("clicked"),
        "email.bounced" => Some("bounced"),
        "email.complained" => Some("complained"),
        "email.delivery_delayed" => Some("delayed"),
        _ => None,
    }
}

/// Event-specific details worth keeping: the clicked link, and the bounce
/// classification. Everything else is reconstructible from the event type.
fn event_payload(event_type: &str, data: &Value) -> Option<Value> {
    match event_type {
        "clicked" => data
            .get("click")
            .and_then(|click| click.get("link"))
            .map(|link| serde_json::json!({ "url": link })),
        "bounced" => data.get("bounce").map(|bounce| {
            serde_json::json!({
                "bounceType": bounce.get("type"),
                "bounceMessage": bounce.get("message")
            })
        }),
        _ => None,
    }
}
