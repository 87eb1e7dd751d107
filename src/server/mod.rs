use crate::config::Config;
use crate::resolver::TierResolver;
use crate::streaming::ProxyStreamer;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_api;
pub mod routes_stream;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Tiered resolver; owns the mirror registry and the local extractor
    pub resolver: Arc<TierResolver>,
    /// Upstream relay for `/stream`
    pub proxy: Arc<ProxyStreamer>,
}

impl AppContext {
    pub fn new(config: Config, resolver: TierResolver, proxy: ProxyStreamer) -> Self {
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            proxy: Arc::new(proxy),
        }
    }

    /// Wire up the production resolver and proxy from configuration.
    pub fn from_config(config: Config) -> Self {
        let resolver = TierResolver::from_config(&config);
        let proxy = ProxyStreamer::from_config(&config);
        Self::new(config, resolver, proxy)
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::RANGE, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_api::root_routes())
        .merge(routes_stream::stream_routes())
        // Same contract under /api for existing frontends
        .nest(
            "/api",
            routes_api::api_routes().merge(routes_stream::stream_routes()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(config);

    let registry = ctx.resolver.registry();
    tracing::info!(
        tier_a = registry.count(podstream_common::Tier::A),
        tier_b = registry.count(podstream_common::Tier::B),
        local_extraction = ctx.resolver.has_extractor(),
        "Resolver ready"
    );

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
