//! Health probe.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use std::time::Duration;

/// GET /health — verifies the database is reachable and the image store
/// responds. A dead database never blocks submissions (the pipeline degrades
/// around it), so this exists for operators and orchestration, not for the
/// drawing client.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let (status_code, database) =
        match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool)).await
        {
            Ok(Ok(_)) => (StatusCode::OK, "healthy".to_string()),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Database health check failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("unhealthy: {}", e),
                )
            }
            Err(_) => {
                tracing::error!("Database health check timed out");
                (StatusCode::SERVICE_UNAVAILABLE, "timeout".to_string())
            }
        };

    // A lightweight exists check against a key that is never written; storage
    // trouble degrades the report but does not fail overall health, since the
    // pipeline already tolerates a failed save.
    let storage = match tokio::time::timeout(
        TIMEOUT,
        state.images.exists("health-check-non-existent-key"),
    )
    .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check warning");
            format!("degraded: {}", e)
        }
        Err(_) => {
            tracing::warn!("Storage health check timed out");
            "timeout".to_string()
        }
    };

    let status = if status_code == StatusCode::OK {
        "healthy"
    } else {
        "unhealthy"
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "database": database,
            "storage": storage,
        })),
    )
}
