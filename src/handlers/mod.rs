use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::collections;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn root() -> ApiResult<Value> {
    let names: Vec<String> = [
        collections::users(),
        collections::habits(),
        collections::instruments(),
    ]
    .into_iter()
    .map(|c| c.name)
    .collect();

    Ok(ApiResponse::success(json!({
        "name": "Homebase API",
        "version": env!("CARGO_PKG_VERSION"),
        "collections": names,
    })))
}

pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    let Some(pool) = &state.db else {
        return ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "disabled"
        }));
    };

    match DatabaseManager::health_check(pool).await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("The requested resource wasn't found.")
}
