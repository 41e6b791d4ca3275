use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

pub mod auth;
pub mod applications;

use auth::ServerState;

/// Multipart body ceiling; headroom above the 10 MiB blob limit so the
/// store's own check is the one that rejects oversized files.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public routes (health, uploads,
/// docs), the auth endpoints, and the protected application API behind the
/// bearer-token middleware.
pub fn build_router(state: ServerState, cors: CorsLayer, upload_dir: &str) -> Router {
    // Public routes (health + uploaded files + API docs)
    let public = Router::new()
        .route("/health", get(health))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()));

    // Token-issuing routes
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Protected application API
    let api = Router::new()
        .route("/applications", post(applications::create).get(applications::list))
        .route(
            "/applications/:id",
            get(applications::get_by_id)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route("/applications/:id/status", patch(applications::set_status))
        .route("/applications/:id/rounds", post(applications::add_round))
        .route(
            "/applications/:id/rounds/:round_id",
            patch(applications::set_round_status).delete(applications::delete_round),
        )
        .route(
            "/applications/:id/attachments",
            post(applications::add_attachment).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/applications/:id/attachments/:attachment_id",
            delete(applications::delete_attachment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    // Compose
    public
        .merge(auth_routes)
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                ),
        )
}
