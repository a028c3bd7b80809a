use actix_web::web;

use crate::routes;

pub fn content_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/intro", web::post().to(routes::generate_intro))
        .route("/blurb", web::post().to(routes::generate_blurb))
        .route("/signoff", web::post().to(routes::generate_signoff))
        .route("/jobs", web::get().to(routes::scrape_jobs));
}
