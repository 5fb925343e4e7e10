//! Boundary to the remote fashion analysis service.
//!
//! Every operation is a single request with a single response. Nothing here
//! holds state across calls; the flows own all state.

mod http;
pub mod wire;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::ImageData;
use crate::models::{
    AnalysisResult, Category, ChatReply, ComparisonResult, RecommendationOption, VisualSuggestion,
};

pub use http::HttpAnalysisClient;

/// Sent when the user attaches a photo to the chat without typing anything.
pub const IMAGE_ONLY_CHAT_MESSAGE: &str = "Please analyze this outfit and give me styling advice.";

/// Failure of a remote call. Callers never get partial results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteServiceError {
    /// Non-success HTTP response
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),
    /// Response did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RemoteServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteServiceError>;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze_garment(&self, image: &ImageData, session_id: &str) -> RemoteResult<AnalysisResult>;

    async fn compare_garments(
        &self,
        image_a: &ImageData,
        image_b: &ImageData,
        session_id: &str,
    ) -> RemoteResult<ComparisonResult>;

    async fn recommend_options(
        &self,
        image: &ImageData,
        prompt: &str,
    ) -> RemoteResult<Vec<RecommendationOption>>;

    async fn visualize_category(
        &self,
        original: &ImageData,
        category: &Category,
    ) -> RemoteResult<Vec<VisualSuggestion>>;

    async fn chat(
        &self,
        session_id: &str,
        text: &str,
        image: Option<&ImageData>,
    ) -> RemoteResult<ChatReply>;

    /// Renders the garment onto the person; returns the generated image.
    async fn try_on(&self, human: &ImageData, garment: &ImageData, prompt: &str) -> RemoteResult<ImageData>;

    /// Prompt ideas for a try-on with this garment.
    async fn try_on_suggestions(&self, garment: &ImageData) -> RemoteResult<Vec<String>>;
}

/// Used with `--offline`: every call fails, so each flow stays usable
/// without a server.
#[derive(Debug, Default, Clone)]
pub struct OfflineAnalysisService;

impl OfflineAnalysisService {
    fn unavailable<T>() -> RemoteResult<T> {
        Err(RemoteServiceError::Transport("running offline".to_string()))
    }
}

#[async_trait]
impl AnalysisService for OfflineAnalysisService {
    async fn analyze_garment(&self, _image: &ImageData, _session_id: &str) -> RemoteResult<AnalysisResult> {
        Self::unavailable()
    }

    async fn compare_garments(
        &self,
        _image_a: &ImageData,
        _image_b: &ImageData,
        _session_id: &str,
    ) -> RemoteResult<ComparisonResult> {
        Self::unavailable()
    }

    async fn recommend_options(
        &self,
        _image: &ImageData,
        _prompt: &str,
    ) -> RemoteResult<Vec<RecommendationOption>> {
        Self::unavailable()
    }

    async fn visualize_category(
        &self,
        _original: &ImageData,
        _category: &Category,
    ) -> RemoteResult<Vec<VisualSuggestion>> {
        Self::unavailable()
    }

    async fn chat(
        &self,
        _session_id: &str,
        _text: &str,
        _image: Option<&ImageData>,
    ) -> RemoteResult<ChatReply> {
        Self::unavailable()
    }

    async fn try_on(&self, _human: &ImageData, _garment: &ImageData, _prompt: &str) -> RemoteResult<ImageData> {
        Self::unavailable()
    }

    async fn try_on_suggestions(&self, _garment: &ImageData) -> RemoteResult<Vec<String>> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::test_image;

    #[test]
    fn test_error_display_and_status() {
        let err = RemoteServiceError::Status {
            status: 500,
            message: "vision model unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: vision model unavailable");
        assert_eq!(err.status(), Some(500));
        assert_eq!(RemoteServiceError::Transport("timed out".into()).status(), None);
    }

    #[tokio::test]
    async fn test_offline_service_fails_every_call() {
        let service = OfflineAnalysisService;
        let image = test_image("shirt");

        let err = service.analyze_garment(&image, "s").await.unwrap_err();
        assert_eq!(err, RemoteServiceError::Transport("running offline".to_string()));
        assert!(service.chat("s", "hi", None).await.is_err());
        assert!(service.try_on_suggestions(&image).await.is_err());
    }
}
