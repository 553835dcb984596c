use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState};

/// GET /utils/health-check/
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<bool>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(format!("{e:#}")))?;
    Ok(Json(true))
}
