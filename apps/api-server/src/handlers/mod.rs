//! HTTP handlers and route configuration.

mod auth;
mod blogs;
mod health;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;

use quill_core::ports::{Cache, RateLimiter};

use crate::middleware::cache::ResponseCache;
use crate::middleware::rate_limit::RateLimit;
use crate::middleware::sanitize::Sanitize;

/// Shared middleware dependencies, built once and handed to every worker.
/// Limiters in particular must be shared or each worker would grant the
/// full budget on its own.
#[derive(Clone)]
pub struct MiddlewareDeps {
    pub global_limiter: Arc<dyn RateLimiter>,
    pub auth_limiter: Arc<dyn RateLimiter>,
    pub cache: Arc<dyn Cache>,
    pub cache_ttl: Duration,
    pub max_payload: usize,
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, deps: &MiddlewareDeps) {
    cfg.route("/health", web::get().to(health::health_check));

    cfg.service(
        web::scope("/api")
            .wrap(Sanitize::new(deps.max_payload))
            .wrap(RateLimit::new(deps.global_limiter.clone()))
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/register")
                            .wrap(RateLimit::new(deps.auth_limiter.clone()).with_message(
                                "Too many authentication attempts, please try again later",
                            ))
                            .route(web::post().to(auth::register)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(RateLimit::new(deps.auth_limiter.clone()).with_message(
                                "Too many authentication attempts, please try again later",
                            ))
                            .route(web::post().to(auth::login)),
                    )
                    .route("/me", web::get().to(auth::me))
                    .route("/update-profile", web::put().to(auth::update_profile))
                    .route("/update-settings", web::put().to(auth::update_settings))
                    .route("/change-password", web::put().to(auth::change_password)),
            )
            .service(
                web::scope("/blogs")
                    .wrap(ResponseCache::new(deps.cache.clone(), deps.cache_ttl))
                    .route("", web::get().to(blogs::list))
                    .route("", web::post().to(blogs::create))
                    // Registered before the catch-all segment so the
                    // literal path wins.
                    .route("/my-blogs", web::get().to(blogs::my_blogs))
                    .route("/{id_or_slug}", web::get().to(blogs::get))
                    .route("/{id}", web::put().to(blogs::update))
                    .route("/{id}", web::delete().to(blogs::delete))
                    .route("/{id}/like", web::post().to(blogs::toggle_like))
                    .route("/{id}/comments", web::post().to(blogs::add_comment))
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::delete().to(blogs::delete_comment),
                    ),
            ),
    );
}
