use actix_web::web;

use crate::routes;

pub fn newsletter_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(routes::list_newsletters))
        .route("", web::post().to(routes::create_newsletter))
        .route("/{id}", web::get().to(routes::get_newsletter))
        .route("/{id}", web::put().to(routes::edit_newsletter))
        .route("/{id}", web::delete().to(routes::delete_newsletter))
        .route("/{id}/duplicate", web::post().to(routes::duplicate_newsletter))
        .route("/{id}/approve", web::post().to(routes::approve_newsletter))
        .route("/{id}/schedule", web::post().to(routes::schedule_newsletter))
        .route(
            "/{id}/unschedule",
            web::post().to(routes::unschedule_newsletter),
        );
}
