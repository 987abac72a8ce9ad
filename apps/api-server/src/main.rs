//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::handlers::{self, MiddlewareDeps};
use api_server::middleware::error::AppError;
use api_server::middleware::headers::security_headers;
use api_server::state::{AppState, build_limiter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    // Redis-backed limiters share counters across workers and instances;
    // without Redis each process enforces its own budget.
    let global_limiter = build_limiter(
        config.redis.as_ref(),
        &config.global_rate_limit,
        "ratelimit:api",
    )
    .await;
    let auth_limiter = build_limiter(
        config.redis.as_ref(),
        &config.auth_rate_limit,
        "ratelimit:auth",
    )
    .await;

    let deps = MiddlewareDeps {
        global_limiter,
        auth_limiter,
        cache: state.cache.clone(),
        cache_ttl: config.cache_ttl,
        max_payload: config.max_payload,
    };

    let max_payload = config.max_payload;
    let production = config.production;
    let mut server = HttpServer::new(move || {
        let deps = deps.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(security_headers(production))
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config(max_payload))
            .configure(move |cfg| handlers::configure_routes(cfg, &deps))
    })
    .bind((config.host.as_str(), config.port))?;

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.run().await
}

/// Json extractor configuration: enforce the payload cap and shape
/// deserialization failures as `{ "message": ... }` like every other error.
fn json_config(max_payload: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_payload)
        .error_handler(|err, _req| {
            let app_err = match &err {
                actix_web::error::JsonPayloadError::Overflow { .. }
                | actix_web::error::JsonPayloadError::OverflowKnownLength { .. } => {
                    AppError::PayloadTooLarge("Request payload is too large".to_string())
                }
                other => AppError::BadRequest(format!("Invalid request body: {other}")),
            };
            app_err.into()
        })
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,quill_infra=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
