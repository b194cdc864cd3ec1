use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod domains;
pub mod users;

use auth::ServerState;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses(
        (status = 200, description = "Service is up", body = crate::openapi::HealthResponse)
    )
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn index() -> &'static str {
    "Flourish"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public routes plus the session-gated admin API
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .route("/api-docs/openapi.json", get(openapi_json));

    // route_layer: the gate only wraps matched routes, unknown paths still 404
    let admin = Router::new()
        .route("/logout", post(auth::logout))
        .route("/domain", get(domains::list).post(domains::create))
        .route("/domain/:domain", get(domains::get).delete(domains::delete))
        .route("/domain/:domain/user", get(users::list).post(users::create))
        .route("/domain/:domain/user/:user", delete(users::delete))
        .route("/domain/:domain/user/:user/alias", post(users::add_alias))
        .route("/domain/:domain/user/:user/alias/:alias", delete(users::remove_alias))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    public
        .merge(admin)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
