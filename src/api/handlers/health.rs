use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::Patient;
use crate::repository::PatientStore;
use crate::search::SearchIndex;

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn PatientStore>,
    pub index: Arc<dyn SearchIndex<Patient>>,
}

fn component(result: &crate::error::Result<()>) -> Value {
    match result {
        Ok(()) => json!({ "status": "UP" }),
        Err(e) => json!({ "status": "DOWN", "details": { "error": e.to_string() } }),
    }
}

/// Health check endpoint - checks the record store and the search index
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    let db = state.store.ping().await;
    let search = state.index.ping().await;

    if let Err(e) = &db {
        tracing::error!(error = %e, "Health check failed - record store unavailable");
    }
    if let Err(e) = &search {
        tracing::error!(error = %e, "Health check failed - search index unavailable");
    }

    let up = db.is_ok() && search.is_ok();
    let status = if up { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if up { "UP" } else { "DOWN" },
            "components": {
                "db": component(&db),
                "elasticsearch": component(&search),
            },
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Readiness check endpoint - ready once the record store answers
pub async fn readiness_check(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => {
            tracing::debug!("Readiness check passed");
            (StatusCode::OK, Json(json!({ "status": "UP" })))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "DOWN" })))
        }
    }
}

/// Liveness check endpoint - indicates if server process is alive
pub async fn liveness_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "UP" })))
}
