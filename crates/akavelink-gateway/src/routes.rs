//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Service endpoints
        .route("/health", get(handlers::health_check))
        .route("/buckets", get(handlers::list_buckets))
        .route("/buckets/", get(handlers::list_buckets))

        // Bucket endpoints
        .route(
            "/buckets/{bucket}",
            post(handlers::create_bucket).delete(handlers::delete_bucket),
        )
        .route(
            "/buckets/{bucket}/files",
            get(handlers::list_files).post(handlers::upload_file),
        )

        // File endpoints
        .route(
            "/buckets/{bucket}/files/{file}",
            get(handlers::file_info).delete(handlers::delete_file),
        )
        .route(
            "/buckets/{bucket}/files/{file}/download",
            get(handlers::download_file),
        )

        // Legacy aliases
        .route("/files/upload/{bucket}", post(handlers::upload_file))
        .route("/files/download/{bucket}/{file}", get(handlers::download_file));

    // Innermost first: rejected requests are still logged and carry an id
    if let Some(limiter) = middleware::create_rate_limiter(state.config.rate_limit_rps) {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }
    router = router
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware));

    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}
