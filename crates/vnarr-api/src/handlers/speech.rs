//! Spoken narration.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    #[validate(length(min = 1))]
    pub narration_text: String,
    #[validate(length(min = 1))]
    pub video_name: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    /// Absent when the audio could not be stored
    pub url: Option<String>,
}

pub async fn synthesize_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> ApiResult<Json<SpeechResponse>> {
    request.validate()?;

    let url = state
        .services
        .speech
        .narrate(&request.narration_text, &request.video_name)
        .await?;

    Ok(Json(SpeechResponse { url }))
}
