use actix_web::web;

use crate::routes;

pub fn email_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/preview/{id}",
        web::get().to(routes::preview_newsletter_email),
    )
    .route("/test/{id}", web::post().to(routes::send_test_newsletter))
    .route("/send/{id}", web::post().to(routes::send_newsletter));
}
