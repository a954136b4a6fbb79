use axum::{http::HeaderValue, middleware::from_fn_with_state, routing::get, Router};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::access::AllowedNetwork;
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers;
use crate::middleware::{admission_middleware, AdmissionGate, Pipeline, Priority};

/// Shared handler state
#[derive(Clone, Default)]
pub struct AppState {
    pub db: Option<PgPool>,
}

/// Routes without any middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Middleware stages for the configured environment
pub fn pipeline(config: &AppConfig) -> Pipeline {
    let allowed = config.access.allowed_network();
    match &allowed {
        AllowedNetwork::Invalid { raw, reason } => {
            tracing::error!(
                allowed = %raw,
                error = %reason,
                "Invalid ALLOWED_HOME_IP CIDR, only private traffic will be admitted"
            );
        }
        AllowedNetwork::Unset => {
            tracing::info!("ALLOWED_HOME_IP not set, only private traffic will be admitted");
        }
        _ => tracing::info!(allowed = %allowed, "Admission allowlist configured"),
    }

    let gate = Arc::new(AdmissionGate::new(
        crate::access::AdmissionFilter::new(allowed),
        config.access.real_ip_resolver(),
    ));

    let mut pipeline = Pipeline::new();

    if config.api.enable_request_logging {
        pipeline.register(Priority::TRACE, "trace", |router| {
            router.layer(TraceLayer::new_for_http())
        });
    }

    pipeline.register(Priority::ADMISSION, "admission", move |router| {
        router.layer(from_fn_with_state(gate, admission_middleware))
    });

    if config.security.enable_cors {
        let cors = cors_layer(&config.security);
        pipeline.register(Priority::CORS, "cors", move |router| router.layer(cors));
    }

    pipeline
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

/// Fully assembled application
pub fn app(config: &AppConfig, state: AppState) -> Router {
    let pipeline = pipeline(config);
    tracing::debug!(stages = ?pipeline.names(), "Request pipeline");
    pipeline.apply(router(state))
}

/// Serve until ctrl-c
pub async fn serve(
    config: &AppConfig,
    listener: TcpListener,
    state: AppState,
) -> anyhow::Result<()> {
    let app = app(config, state);

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
