//! Per-stage model handles.
//!
//! A [`StageModel`] pins a provider, model id and temperature so a stage
//! only ever sees `complete(prompt) -> text`.

use citewright_core::error::ProviderError;
use citewright_core::event::Stage;
use citewright_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct StageModel {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl StageModel {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Send one user prompt and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::prompt(&self.model, prompt, self.temperature);
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model call complete"
            );
        }
        Ok(response.message.content)
    }
}

impl std::fmt::Debug for StageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageModel")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// One model handle per stage.
#[derive(Debug, Clone)]
pub struct StageModels {
    pub research: StageModel,
    pub validation: StageModel,
    pub writer: StageModel,
    pub citation: StageModel,
}

impl StageModels {
    /// The same model and temperature for every stage.
    pub fn uniform(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        let m = StageModel::new(provider, model, temperature);
        Self {
            research: m.clone(),
            validation: m.clone(),
            writer: m.clone(),
            citation: m,
        }
    }

    pub fn get(&self, stage: Stage) -> &StageModel {
        match stage {
            Stage::Research => &self.research,
            Stage::Validation => &self.validation,
            Stage::Writer => &self.writer,
            Stage::Citation => &self.citation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;

    #[tokio::test]
    async fn complete_sends_pinned_settings() {
        let provider = Arc::new(SequentialMockProvider::texts(&["pong"]));
        let model = StageModel::new(provider.clone(), "google/gemma-3-27b-it:free", 0.15)
            .with_max_tokens(256);

        assert_eq!(model.complete("ping").await.unwrap(), "pong");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "google/gemma-3-27b-it:free");
        assert_eq!(requests[0].max_tokens, Some(256));
        assert_eq!(requests[0].messages[0].content, "ping");
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let provider = Arc::new(SequentialMockProvider::failing(ProviderError::RateLimited {
            retry_after_secs: 3,
        }));
        let model = StageModel::new(provider, "m", 0.1);
        assert!(matches!(
            model.complete("x").await,
            Err(ProviderError::RateLimited { retry_after_secs: 3 })
        ));
    }

    #[test]
    fn uniform_models_share_settings() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let models = StageModels::uniform(provider, "m", 0.4);
        assert_eq!(models.get(Stage::Citation).model(), "m");
        assert!((models.get(Stage::Writer).temperature() - 0.4).abs() < f32::EPSILON);
    }
}
