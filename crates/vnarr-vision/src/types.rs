//! Chat wire types.

use serde::{Deserialize, Serialize};

use crate::error::{VisionError, VisionResult};

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message. `images` carries base64 payloads without a data-URL prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            images: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: None,
        }
    }

    /// Attach base64 image payloads.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }
}

/// Chat request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Always false; replies are read in one piece.
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

/// Raw chat response body. Fields are optional so that shape problems surface
/// from [`ChatResponse::validate`] rather than as opaque JSON errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Validated model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

impl ChatResponse {
    /// Check the response shape and extract the reply text.
    pub fn validate(self) -> VisionResult<ChatReply> {
        let message = self
            .message
            .ok_or_else(|| VisionError::invalid_response("missing `message`"))?;
        let text = message
            .content
            .ok_or_else(|| VisionError::invalid_response("missing `message.content`"))?;

        if text.trim().is_empty() {
            return Err(VisionError::invalid_response("empty `message.content`"));
        }

        Ok(ChatReply { text })
    }
}

/// `GET /api/tags` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// One installed model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub details: ModelDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub families: Option<Vec<String>>,
}

impl ModelInfo {
    /// Models with a CLIP image encoder accept images.
    pub fn is_vision_capable(&self) -> bool {
        self.details
            .families
            .as_ref()
            .is_some_and(|families| families.iter().any(|f| f == "clip"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest::new(
            "llava",
            vec![
                ChatMessage::system("be funny"),
                ChatMessage::user("describe").with_images(vec!["aGk=".into()]),
            ],
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llava");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["messages"][1]["images"][0], "aGk=");
    }

    #[test]
    fn test_validate_ok() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"model":"llava","message":{"role":"assistant","content":"A cat."}}"#)
                .unwrap();
        assert_eq!(response.validate().unwrap().text, "A cat.");
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        for body in [
            r#"{"model":"llava"}"#,
            r#"{"message":{"role":"assistant"}}"#,
            r#"{"message":{"role":"assistant","content":"   "}}"#,
        ] {
            let response: ChatResponse = serde_json::from_str(body).unwrap();
            assert!(
                matches!(response.validate(), Err(VisionError::InvalidResponse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_vision_capable() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[
                {"name":"llava:latest","details":{"families":["llama","clip"]}},
                {"name":"llama3:latest","details":{"families":["llama"]}},
                {"name":"old:latest","details":{"families":null}},
                {"name":"bare"}
            ]}"#,
        )
        .unwrap();

        let vision: Vec<_> = tags
            .models
            .iter()
            .filter(|m| m.is_vision_capable())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(vision, vec!["llava:latest"]);
    }
}
