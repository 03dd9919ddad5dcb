//! Live capture description.

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiResult;
use crate::state::AppState;

/// Inline frames from a capture source.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DescribeFramesRequest {
    /// Base64 images, optionally as data URLs, in grid order
    #[validate(length(min = 1, max = 6))]
    pub frames: Vec<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub video_key: Option<String>,
}

/// Caption one capture collage.
///
/// Responds with `"{caption}COLLAGE_URL:{url}"` as plain text.
pub async fn describe_frames(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<DescribeFramesRequest>,
) -> ApiResult<String> {
    request.validate()?;

    let model = state
        .services
        .vision
        .config()
        .resolve_model(request.model_name.as_deref())
        .to_string();

    let description = state
        .services
        .pipeline
        .describe_frames(request.frames, request.video_key.as_deref(), &model)
        .await?;

    Ok(description.response_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_bounds() {
        let empty = DescribeFramesRequest {
            frames: vec![],
            model_name: None,
            video_key: None,
        };
        assert!(empty.validate().is_err());

        let seven = DescribeFramesRequest {
            frames: vec!["x".to_string(); 7],
            model_name: None,
            video_key: None,
        };
        assert!(seven.validate().is_err());

        let six = DescribeFramesRequest {
            frames: vec!["x".to_string(); 6],
            model_name: None,
            video_key: None,
        };
        assert!(six.validate().is_ok());
    }
}
