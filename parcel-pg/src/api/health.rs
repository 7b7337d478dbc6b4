use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Description du service
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "title": "parcel-pg",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ingest parcels into PostGIS and serve their land-cover summaries",
    }))
}

/// Vérifie la connexion à la base (`SELECT 1`)
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match crate::store::test_connection(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "healthy" })),
        Err(e) => {
            warn!("Health check failed: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                }),
            )
        }
    }
}
