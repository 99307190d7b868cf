//! HTTP handlers and route configuration.

mod accounts;
mod auth;
mod blogs;
mod health;
mod present;
mod uploads;
mod users;


use actix_web::web;

use crate::middleware::error::{json_error_handler, path_error_handler, query_error_handler};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health_check))
                // Accounts
                .route("/register", web::post().to(accounts::register))
                .route("/verify", web::get().to(accounts::verify_email))
                .route("/forgot-password", web::post().to(accounts::forgot_password))
                .route("/reset-password", web::post().to(accounts::reset_password))
                // Sessions
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout))
                        .route("/session", web::get().to(auth::session))
                        .route("/session", web::post().to(auth::update_session)),
                )
                // Posts
                .service(
                    web::scope("/blogs")
                        .route("", web::get().to(blogs::list))
                        .route("", web::post().to(blogs::create))
                        .route("/{id}", web::get().to(blogs::get))
                        .route("/{id}", web::put().to(blogs::update))
                        .route("/{id}", web::delete().to(blogs::delete))
                        .route("/{id}/like", web::post().to(blogs::toggle_like))
                        .route("/{id}/comments", web::get().to(blogs::comments))
                        .route("/{id}/comments", web::post().to(blogs::add_comment)),
                )
                // Current user
                .service(
                    web::scope("/user")
                        .route("/profile", web::get().to(users::profile))
                        .route("/profile", web::put().to(users::update_profile))
                        .route("/posts", web::get().to(users::posts))
                        .route("/upload-image", web::post().to(users::upload_image)),
                )
                .route("/upload", web::post().to(uploads::upload)),
        );
}
