//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{compare_handler, generate_handler, health, ready};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &Config::default())
}

/// Create the application router with custom configuration
pub fn create_router_with_config(state: AppState, config: &Config) -> Router {
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let mut router = Router::new()
        .route("/compare/", post(compare_handler))
        .route("/compare", post(compare_handler))
        .route("/health", get(health))
        .route("/ready", get(ready));

    if state.generator.is_some() {
        router = router.route("/generate_image", post(generate_handler));
    } else {
        tracing::info!("Image generation: DISABLED");
    }

    let router = router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(timeout);

    // Rate limiting is off in tests and on in production
    if config.rate_limit_enabled {
        let governor_conf = match GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_sec)
            .burst_size(config.rate_limit_burst)
            .finish()
        {
            Some(conf) => conf,
            None => {
                tracing::error!(
                    per_sec = config.rate_limit_per_sec,
                    burst = config.rate_limit_burst,
                    "Invalid rate limit settings, rate limiting DISABLED"
                );
                return router.layer(TraceLayer::new_for_http());
            }
        };

        tracing::info!(
            "Rate limiting: {} req/s (burst: {})",
            config.rate_limit_per_sec,
            config.rate_limit_burst
        );

        router
            .layer(GovernorLayer::new(Arc::new(governor_conf)))
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Rate limiting: DISABLED");
        router.layer(TraceLayer::new_for_http())
    }
}
