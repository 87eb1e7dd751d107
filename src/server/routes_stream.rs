//! `/resolve/{id}` and `/stream/{id}`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Json, Router,
};
use podstream_common::{Error, MediaId, ResolutionResult};
use tracing::debug;

use super::error::AppError;
use crate::server::AppContext;

pub fn stream_routes() -> Router<AppContext> {
    Router::new()
        .route("/resolve/:id", get(resolve))
        .route("/stream/:id", get(stream))
}

/// Resolve an id to a playable URL. A missing stream is a fallback, not an error.
async fn resolve(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ResolutionResult>, AppError> {
    let id: MediaId = id.parse()?;
    Ok(Json(ctx.resolver.resolve(&id).await))
}

/// Re-resolve `id` and relay the upstream audio, forwarding any Range header.
async fn stream(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id: MediaId = id.parse()?;

    let resolved = ctx
        .resolver
        .resolve_upstream(&id)
        .await
        .ok_or_else(|| Error::no_stream(id.as_str()))?;

    let range = headers.get(header::RANGE);
    debug!(%id, source = %resolved.source, range = ?range, "proxying stream");

    Ok(ctx.proxy.proxy(&resolved.url, range).await?)
}
