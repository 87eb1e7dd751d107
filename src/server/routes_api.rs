use crate::server::AppContext;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use podstream_common::Tier;

/// Routes served at the root.
pub fn root_routes() -> Router<AppContext> {
    Router::new().route("/", get(status))
}

/// Routes nested under `/api`.
pub fn api_routes() -> Router<AppContext> {
    Router::new().route("/ping", get(ping))
}

async fn status(State(ctx): State<AppContext>) -> impl IntoResponse {
    let registry = ctx.resolver.registry();
    Json(serde_json::json!({
        "service": "podstream",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/resolve/{id}",
            "/stream/{id}",
            "/api/resolve/{id}",
            "/api/stream/{id}",
            "/api/ping",
            "/health"
        ],
        "mirrors": {
            "tierA": registry.count(Tier::A),
            "tierB": registry.count(Tier::B)
        },
        "localExtraction": ctx.resolver.has_extractor()
    }))
}

async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "pong"
    }))
}
