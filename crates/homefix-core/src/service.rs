//! `diagnose` and `chat` entrypoints
//!
//! `HomeRepairService` wires the media normalizer, diagnostic engine and chat
//! responder around one shared generation provider. It holds no per-request
//! state and works without any persistence.

use crate::analysis::AnalysisResult;
use crate::chat::{ChatConfig, ChatRequest, ChatResponder};
use crate::engine::{DiagnosticEngine, EngineConfig};
use crate::error::Result;
use crate::media::{ImageUpload, MediaConfig, MediaNormalizer};
use crate::types::DiagnosticRequest;
use homefix_llm::GenerationProvider;
use std::sync::Arc;
use tracing::instrument;

/// Settings for every component of the service
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Diagnosis generation settings
    pub engine: EngineConfig,
    /// Chat generation settings
    pub chat: ChatConfig,
    /// Upload limits
    pub media: MediaConfig,
}

/// Stateless home repair diagnosis service
pub struct HomeRepairService {
    provider: Arc<dyn GenerationProvider>,
    engine: DiagnosticEngine,
    responder: ChatResponder,
    media: MediaNormalizer,
}

impl HomeRepairService {
    /// Create a service with default settings
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self::with_config(provider, ServiceConfig::default())
    }

    /// Create a service with explicit settings
    pub fn with_config(provider: Arc<dyn GenerationProvider>, config: ServiceConfig) -> Self {
        Self {
            engine: DiagnosticEngine::with_config(Arc::clone(&provider), config.engine),
            responder: ChatResponder::with_config(Arc::clone(&provider), config.chat),
            media: MediaNormalizer::new(config.media),
            provider,
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Upload limits in effect
    pub fn media_config(&self) -> &MediaConfig {
        self.media.config()
    }

    /// Fail with `TooManyFiles` once `count` uploads exceed the limit.
    ///
    /// Lets a transport reject an oversized batch before buffering it.
    pub fn check_upload_count(&self, count: usize) -> Result<()> {
        self.media.check_count(count)
    }

    /// Run one diagnostic round.
    ///
    /// The request is validated first, then the upload count, then every
    /// image is normalized; only then is the model called.
    #[instrument(skip(self, uploads, request), fields(
        images = uploads.len(),
        history = request.conversation_history.len(),
    ))]
    pub async fn diagnose(
        &self,
        uploads: Vec<ImageUpload>,
        request: DiagnosticRequest,
    ) -> Result<AnalysisResult> {
        request.validate()?;
        let images = self.media.normalize_all(uploads).await?;
        self.engine.diagnose(&request, &images).await
    }

    /// Answer a follow-up question about a finished analysis
    pub async fn chat(&self, request: ChatRequest) -> Result<String> {
        self.responder.respond(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::AnalysisContext;
    use crate::error::Error;
    use homefix_llm::MockProvider;

    fn service(mock: &MockProvider) -> HomeRepairService {
        HomeRepairService::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_diagnose_without_images() {
        let mock = MockProvider::with_reply(r#"{"confidence": 0.3, "questions": [{"question": "Where?"}]}"#);
        let result = service(&mock)
            .diagnose(Vec::new(), DiagnosticRequest::new("Mystery drip"))
            .await
            .unwrap();

        assert!(result.needs_more_info);
        assert_eq!(mock.last_request().unwrap().image_count(), 0);
    }

    #[tokio::test]
    async fn test_too_many_files_skips_model() {
        let mock = MockProvider::new();
        let uploads = (0..5)
            .map(|_| ImageUpload::new(vec![1, 2, 3], "image/jpeg"))
            .collect();

        let err = service(&mock)
            .diagnose(uploads, DiagnosticRequest::new("Mystery drip"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TooManyFiles { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_upload_count_limit() {
        let mock = MockProvider::new();
        let service = service(&mock);

        assert!(service.check_upload_count(4).is_ok());
        assert!(matches!(
            service.check_upload_count(5),
            Err(Error::TooManyFiles { count: 5, max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_checked_before_images() {
        let mock = MockProvider::new();
        let uploads = vec![ImageUpload::new(vec![1, 2, 3], "image/gif")];

        let err = service(&mock)
            .diagnose(uploads, DiagnosticRequest::new(""))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_chat_delegates() {
        let mock = MockProvider::with_reply("  About an hour.  ");
        let request = ChatRequest {
            original_description: "Running toilet".to_string(),
            analysis_context: AnalysisContext::default(),
            history: Vec::new(),
            message: "How long will it take?".to_string(),
        };

        let reply = service(&mock).chat(request).await.unwrap();
        assert_eq!(reply, "About an hour.");
    }

    #[test]
    fn test_provider_name() {
        let service = HomeRepairService::new(Arc::new(MockProvider::new()));
        assert_eq!(service.provider_name(), "mock");
    }
}
