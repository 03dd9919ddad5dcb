//! Vision model discovery.

use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::state::AppState;

/// Installed models that accept images.
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let models = state.services.vision.list_vision_models().await?;
    Ok(Json(models))
}
