use actix_web::web;

use crate::routes;

pub fn subscriber_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes (linked from emails and the signup form)
        .route("/subscribe", web::post().to(routes::subscribe))
        .route(
            "/subscribe/verify",
            web::get().to(routes::verify_subscription),
        )
        .route("/unsubscribe", web::get().to(routes::unsubscribe))
        // Admin routes
        .route("", web::get().to(routes::list_subscribers))
        .route("", web::post().to(routes::create_subscriber))
        .route("/{id}", web::put().to(routes::edit_subscriber))
        .route("/{id}", web::delete().to(routes::delete_subscriber));
}
