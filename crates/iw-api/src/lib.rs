//! # iw-api
//!
//! The web routing and orchestration layer for Inkwell.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the blog.
///
/// A scoped configuration lets the binary mount everything under a
/// different prefix if it ever needs to.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // The paginated feed
            .route("/", web::get().to(handlers::index))
            // Group and profile listings
            .route("/group/{slug}/", web::get().to(handlers::group_posts))
            .route("/profile/{username}/", web::get().to(handlers::profile))
            // Authoring
            .route("/create/", web::get().to(handlers::post_create_form))
            .route("/create/", web::post().to(handlers::post_create))
            // Post detail, editing, commenting
            .route("/posts/{id}/", web::get().to(handlers::post_detail))
            .route("/posts/{id}/edit/", web::get().to(handlers::post_edit_form))
            .route("/posts/{id}/edit/", web::post().to(handlers::post_edit))
            .route("/posts/{id}/comment/", web::post().to(handlers::add_comment)),
    );
}
