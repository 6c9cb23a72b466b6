//! Analysis Client
//!
//! Sends the secret image to a remote captioning service and returns a
//! cryptic title and a one-sentence description. Every failure is turned
//! into a fixed fallback result; callers never see an error.

pub mod gemini;
mod prompt;

pub use gemini::GeminiService;
pub use prompt::{configuration_fallback, fault_fallback, prompt_for};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, Locale};
use crate::error::AnalysisError;
use crate::state::data::SecretImage;

/// Title/description pair shown on the result screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub description: String,
}

impl AnalysisResult {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Injected analysis capability
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: &SecretImage) -> AnalysisResult;
}

/// One captioning call
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRequest<'a> {
    pub mime: &'a str,
    /// Base64 image bytes without any data URL prefix
    pub data: &'a str,
    pub prompt: &'a str,
}

/// Raw remote captioning call; may fail
#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn caption(&self, request: &CaptionRequest<'_>) -> Result<AnalysisResult, AnalysisError>;
}

/// Analyzer that maps every captioning failure to a fallback result
#[derive(Debug)]
pub struct AnalysisClient<S> {
    service: S,
    locale: Locale,
}

impl<S: CaptionService> AnalysisClient<S> {
    pub fn new(service: S, locale: Locale) -> Self {
        Self { service, locale }
    }
}

#[async_trait]
impl<S: CaptionService> Analyzer for AnalysisClient<S> {
    async fn analyze(&self, image: &SecretImage) -> AnalysisResult {
        let request = CaptionRequest {
            mime: image.mime(),
            data: image.base64_payload(),
            prompt: prompt_for(self.locale),
        };

        match self.service.caption(&request).await {
            Ok(result) => {
                tracing::info!(title = %result.title, "✨ Analysis complete");
                result
            }
            Err(AnalysisError::MissingCredentials) => {
                tracing::error!("API key is missing; set GEMINI_API_KEY or api_key in the config file");
                configuration_fallback(self.locale)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Analysis failed, using fallback");
                fault_fallback(self.locale)
            }
        }
    }
}

/// Analyzer used when no captioning client could be built
///
/// Reports a missing key the same way the real client would.
#[derive(Debug)]
pub struct OfflineAnalyzer {
    locale: Locale,
    has_credentials: bool,
}

impl OfflineAnalyzer {
    pub fn new(locale: Locale, has_credentials: bool) -> Self {
        Self {
            locale,
            has_credentials,
        }
    }
}

#[async_trait]
impl Analyzer for OfflineAnalyzer {
    async fn analyze(&self, _image: &SecretImage) -> AnalysisResult {
        if self.has_credentials {
            fault_fallback(self.locale)
        } else {
            configuration_fallback(self.locale)
        }
    }
}

/// The analyzer for this configuration
pub fn build_analyzer(config: &Config) -> Arc<dyn Analyzer> {
    match GeminiService::from_config(config) {
        Ok(service) => Arc::new(AnalysisClient::new(service, config.locale)),
        Err(err) => {
            tracing::error!(error = %err, "Captioning client unavailable, results will fall back");
            Arc::new(OfflineAnalyzer::new(config.locale, config.api_key.is_some()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedService;
    use super::*;

    fn cat() -> SecretImage {
        SecretImage::from_bytes(Some("cat.jpg".into()), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let reply = AnalysisResult::new("Feline Oracle", "The cat was always watching.");
        let client = AnalysisClient::new(ScriptedService::new(Ok(reply.clone())), Locale::English);
        assert_eq!(client.analyze(&cat()).await, reply);
    }

    #[tokio::test]
    async fn test_prefix_is_stripped_before_sending() {
        let client = AnalysisClient::new(
            ScriptedService::new(Ok(AnalysisResult::new("t", "d"))),
            Locale::English,
        );
        client.analyze(&cat()).await;
        let requests = client.service.requests.lock().unwrap().clone();
        assert_eq!(requests, vec![("image/jpeg".to_string(), "/9j/4AAQ".to_string())]);
    }

    #[tokio::test]
    async fn test_missing_credentials_fallback() {
        let client = AnalysisClient::new(
            ScriptedService::new(Err(AnalysisError::MissingCredentials)),
            Locale::English,
        );
        let result = client.analyze(&cat()).await;
        assert_eq!(result.title, "Configuration Error");
    }

    #[tokio::test]
    async fn test_service_failures_fall_back_to_fault() {
        let failures = [
            AnalysisError::Network("connection refused".into()),
            AnalysisError::Status(500, "boom".into()),
            AnalysisError::EmptyResponse,
            AnalysisError::Malformed("expected value".into()),
        ];
        for failure in failures {
            let client = AnalysisClient::new(ScriptedService::new(Err(failure)), Locale::English);
            assert_eq!(client.analyze(&cat()).await, fault_fallback(Locale::English));
        }
    }

    #[tokio::test]
    async fn test_offline_analyzer_with_key_faults() {
        let analyzer = OfflineAnalyzer::new(Locale::English, true);
        assert_eq!(analyzer.analyze(&cat()).await, fault_fallback(Locale::English));
    }

    #[tokio::test]
    async fn test_offline_analyzer_without_key_reports_configuration() {
        let analyzer = OfflineAnalyzer::new(Locale::English, false);
        assert_eq!(
            analyzer.analyze(&cat()).await,
            configuration_fallback(Locale::English)
        );
    }

    #[tokio::test]
    async fn test_built_analyzer_without_key_reports_configuration() {
        let config = Config {
            api_key: None,
            locale: Locale::SimplifiedChinese,
            ..Config::default()
        };
        let analyzer = build_analyzer(&config);
        assert_eq!(
            analyzer.analyze(&cat()).await,
            configuration_fallback(Locale::SimplifiedChinese)
        );
    }

    #[tokio::test]
    async fn test_fallbacks_follow_locale() {
        let client = AnalysisClient::new(
            ScriptedService::new(Err(AnalysisError::EmptyResponse)),
            Locale::SimplifiedChinese,
        );
        assert_eq!(client.analyze(&cat()).await.title, "检测到故障");
    }
}
