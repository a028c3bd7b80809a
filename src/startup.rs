use crate::completion_client::CompletionClient;
use crate::configuration::{Configuration, ContentConfigs, DatabaseConfigs};
use crate::email_client::EmailClient;
use crate::rate_limit::SubscribeRateLimiter;
use crate::routes::{
    analytics_routes, content_routes, email_routes, health_check, newsletter_routes,
    subscriber_routes, webhook_routes,
};
use crate::scraper::Scraper;
use crate::token::UnsubscribeKey;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Configuration) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&config.database);

        let email_client = config.email_client.client();
        let completion_client = config.completion_client.client();
        let scraper = config.content.scraper();
        let unsubscribe_key = UnsubscribeKey::new(config.application.unsubscribe_secret);

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)
            .with_context(|| "Failed to bind TCP listener for application")?;
        let port = listener
            .local_addr()
            .with_context(|| "Failed to read local address of TCP listener")?
            .port();
        let server = run(
            listener,
            connection_pool,
            email_client,
            completion_client,
            scraper,
            unsubscribe_key,
            config.application.base_url,
            config.application.confirm_redirect_url,
            config.content,
        )
        .context("Failed to run Actix web server")?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        // run returns a Server type, which implements Future trait
        self.server.await.context("Server stopped with an error")
    }
}

pub fn get_connection_pool(config: &DatabaseConfigs) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(config.connect_options())
}

/// Public base URL embedded in verification and unsubscribe links.
pub struct ApplicationBaseUrl(pub String);

/// Where the browser lands after confirming a subscription, when configured.
pub struct ConfirmRedirectUrl(pub Option<String>);

#[allow(clippy::too_many_arguments)]
fn run(
    tcp_listener: TcpListener,
    db_pool: PgPool,
    email_client: EmailClient,
    completion_client: CompletionClient,
    scraper: Scraper,
    unsubscribe_key: UnsubscribeKey,
    base_url: String,
    confirm_redirect_url: Option<String>,
    content: ContentConfigs,
) -> Result<Server, anyhow::Error> {
    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let completion_client = web::Data::new(completion_client);
    let scraper = web::Data::new(scraper);
    let unsubscribe_key = web::Data::new(unsubscribe_key);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));
    let confirm_redirect_url = web::Data::new(ConfirmRedirectUrl(confirm_redirect_url));
    let content = web::Data::new(content);
    let rate_limiter = web::Data::new(SubscribeRateLimiter::new());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .configure(configure_routes)
            // register the db connection as part of the application state
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(completion_client.clone())
            .app_data(scraper.clone())
            .app_data(unsubscribe_key.clone())
            .app_data(base_url.clone())
            .app_data(confirm_redirect_url.clone())
            .app_data(content.clone())
            .app_data(rate_limiter.clone())
    })
    .listen(tcp_listener)
    .with_context(|| "Failed to bind Actix server to TCP listener")?
    .run();

    Ok(server)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .service(
            web::scope("/v1")
                .service(web::scope("/newsletters").configure(newsletter_routes))
                .service(web::scope("/subscribers").configure(subscriber_routes))
                .service(web::scope("/email").configure(email_routes))
                .service(web::scope("/content").configure(content_routes))
                .service(web::scope("/webhooks").configure(webhook_routes))
                .service(web::scope("/analytics").configure(analytics_routes)),
        );
}
