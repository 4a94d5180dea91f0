//! Axum router construction.
//!
//! Builds the application router with all route groups, middleware layers,
//! and the OpenAPI document route.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::download::submit_download,
        routes::files::serve_download,
        routes::tools::get_tools,
    ),
    components(schemas(
        routes::download::DownloadRequest,
        routes::download::DownloadResponse,
        routes::tools::ToolResponse,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Legacy clients submit to the root path; keep that mount working.
        .route("/", post(routes::download::submit_download))
        .route("/api/download", post(routes::download::submit_download))
        .route("/api/tools", get(routes::tools::get_tools))
        .route("/download/{file_name}", get(routes::files::serve_download))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
