//! Video catalog and narration runs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use validator::Validate;

use vnarr_cache::ProgressChannel;
use vnarr_models::{VideoAsset, VideoListing};
use vnarr_storage::list_videos as list_video_objects;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// List every `.mp4` in the bucket.
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<Vec<VideoListing>>> {
    let videos = list_video_objects(state.services.store.as_ref()).await?;
    Ok(Json(videos))
}

/// Request to narrate a stored video.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DescribeVideoRequest {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 512))]
    pub key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeVideoResponse {
    /// Progress channel to subscribe to
    pub channel: String,
    pub model_name: String,
}

/// Start a narration run in the background.
///
/// Progress, ending with `END`, is streamed on `/ws/progress/{key}`.
pub async fn describe_video(
    State(state): State<AppState>,
    Json(request): Json<DescribeVideoRequest>,
) -> ApiResult<(StatusCode, Json<DescribeVideoResponse>)> {
    request.validate()?;

    let video = VideoAsset::new(request.url, request.key)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let model = state
        .services
        .vision
        .config()
        .resolve_model(request.model_name.as_deref())
        .to_string();
    let channel = ProgressChannel::channel_name(video.key());

    info!(video_key = %video.key(), model = %model, "Starting narration run");
    metrics::record_run_started();

    let pipeline = state.services.pipeline.clone();
    let run_model = model.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.run(&video, &run_model).await {
            metrics::record_run_failed();
            error!(video_key = %video.key(), error = %e, "Narration run failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(DescribeVideoResponse {
            channel,
            model_name: model,
        }),
    ))
}
