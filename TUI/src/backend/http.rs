// HTTP transport for the analysis service (multipart uploads + JSON)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::wire::{self, RecommendRequest, VisualizeRequest};
use super::{AnalysisService, RemoteResult, RemoteServiceError, IMAGE_ONLY_CHAT_MESSAGE};
use crate::error::{Error, Result};
use crate::media::ImageData;
use crate::models::{
    AnalysisResult, Category, ChatReply, ComparisonResult, RecommendationOption, VisualSuggestion,
};

#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, context: &str, request: RequestBuilder) -> RemoteResult<Vec<u8>> {
        debug!(endpoint = context, "sending request");
        let response = request.send().await.map_err(|e| {
            RemoteServiceError::Transport(format!("{} request failed: {}", context, e))
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            RemoteServiceError::Transport(format!("{} response unreadable: {}", context, e))
        })?;

        if !status.is_success() {
            let message = wire::error_message(&String::from_utf8_lossy(&body));
            warn!(endpoint = context, status = status.as_u16(), %message, "request failed");
            return Err(RemoteServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }

    async fn post_form(&self, path: &str, form: Form) -> RemoteResult<Vec<u8>> {
        let request = self.client.post(self.url(path)).multipart(form);
        self.send(path, request).await
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> RemoteResult<Vec<u8>> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(path, request).await
    }
}

fn image_part(image: &ImageData) -> RemoteResult<Part> {
    Part::bytes(image.bytes().to_vec())
        .file_name(image.file_name().to_string())
        .mime_str(image.mime())
        .map_err(|e| RemoteServiceError::Transport(format!("invalid mime '{}': {}", image.mime(), e)))
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze_garment(&self, image: &ImageData, session_id: &str) -> RemoteResult<AnalysisResult> {
        let form = Form::new()
            .part("image", image_part(image)?)
            .text("session_id", session_id.to_string());
        let body = self.post_form("analyze-garment", form).await?;
        wire::decode::<wire::GarmentAnalysisDto>("analyze-garment", &body)?.try_into()
    }

    async fn compare_garments(
        &self,
        image_a: &ImageData,
        image_b: &ImageData,
        session_id: &str,
    ) -> RemoteResult<ComparisonResult> {
        let form = Form::new()
            .part("image1", image_part(image_a)?)
            .part("image2", image_part(image_b)?)
            .text("session_id", session_id.to_string());
        let body = self.post_form("compare-garments", form).await?;
        wire::decode::<wire::CompareResponseDto>("compare-garments", &body)?.try_into()
    }

    async fn recommend_options(
        &self,
        image: &ImageData,
        prompt: &str,
    ) -> RemoteResult<Vec<RecommendationOption>> {
        let request = RecommendRequest {
            image: image.data_url(),
            prompt,
        };
        let body = self.post_json("tara/analyze", &request).await?;
        wire::decode::<wire::RecommendResponseDto>("tara/analyze", &body)?.try_into()
    }

    async fn visualize_category(
        &self,
        original: &ImageData,
        category: &Category,
    ) -> RemoteResult<Vec<VisualSuggestion>> {
        let request = VisualizeRequest {
            original_image: original.data_url(),
            category: &category.name,
            keywords: &category.keywords,
            description: &category.description,
        };
        let body = self.post_json("tara/visualize", &request).await?;
        Ok(wire::decode::<wire::VisualizeResponseDto>("tara/visualize", &body)?.into())
    }

    async fn chat(
        &self,
        session_id: &str,
        text: &str,
        image: Option<&ImageData>,
    ) -> RemoteResult<ChatReply> {
        let message = if text.trim().is_empty() && image.is_some() {
            IMAGE_ONLY_CHAT_MESSAGE
        } else {
            text
        };
        let mut form = Form::new()
            .text("session_id", session_id.to_string())
            .text("message", message.to_string());
        if let Some(image) = image {
            form = form.part("image", image_part(image)?);
        }
        let body = self.post_form("chat", form).await?;
        Ok(wire::decode::<wire::ChatResponseDto>("chat", &body)?.into())
    }

    async fn try_on(&self, human: &ImageData, garment: &ImageData, prompt: &str) -> RemoteResult<ImageData> {
        let form = Form::new()
            .part("human_image", image_part(human)?)
            .part("garment_image", image_part(garment)?)
            .text("prompt", prompt.to_string());
        let body = self.post_form("try-on/edit", form).await?;
        ImageData::from_bytes(body, "try-on.png")
            .map_err(|e| RemoteServiceError::Malformed(format!("try-on/edit: {}", e)))
    }

    async fn try_on_suggestions(&self, garment: &ImageData) -> RemoteResult<Vec<String>> {
        let form = Form::new().part("file", image_part(garment)?);
        let body = self.post_form("try-on/suggestions", form).await?;
        Ok(wire::decode::<wire::TryOnSuggestionsDto>("try-on/suggestions", &body)?.suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = HttpAnalysisClient::new("http://localhost:8005/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8005/api");
        assert_eq!(client.url("/tara/analyze"), "http://localhost:8005/api/tara/analyze");
        assert_eq!(client.url("chat"), "http://localhost:8005/api/chat");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let client = HttpAnalysisClient::new("http://127.0.0.1:9/api", Duration::from_millis(500)).unwrap();
        let err = client.chat("session", "hello", None).await.unwrap_err();
        assert!(matches!(err, RemoteServiceError::Transport(_)));
    }
}
