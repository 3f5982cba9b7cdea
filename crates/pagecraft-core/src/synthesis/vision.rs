//! Vision-based code generation behind a trait.
//!
//! The pixel-faithful strategy may hand a region's screenshot to a
//! [`VisionGenerator`]. Synthesis works fully without one.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DesignTokens, ExtractedContent, SemanticType};

/// Everything the generator sees about a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionRequest {
    pub component_name: String,
    pub kind: SemanticType,
    pub screenshot: PathBuf,
    pub content: ExtractedContent,
    pub design_tokens: Option<DesignTokens>,
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Http(String),

    #[error("vision request timed out")]
    Timeout,

    #[error("vision service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vision service returned no code")]
    EmptyResponse,

    #[error("cannot read screenshot: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VisionError::Timeout
        } else {
            VisionError::Http(err.to_string())
        }
    }
}

/// Upstream code generator. Returns component source text.
#[async_trait]
pub trait VisionGenerator: Send + Sync {
    async fn generate(&self, request: &VisionRequest) -> Result<String, VisionError>;
}

/// Endpoint settings for [`HttpVisionGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    component_name: &'a str,
    semantic_type: SemanticType,
    screenshot_base64: String,
    content: &'a ExtractedContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    design_tokens: Option<&'a DesignTokens>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    code: String,
}

/// JSON-over-HTTP vision generator. Posts the base64 screenshot together
/// with extracted content and tokens, and expects `{ "code": "..." }` back.
pub struct HttpVisionGenerator {
    config: VisionConfig,
    client: reqwest::Client,
}

impl HttpVisionGenerator {
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pagecraft/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl VisionGenerator for HttpVisionGenerator {
    async fn generate(&self, request: &VisionRequest) -> Result<String, VisionError> {
        let bytes = tokio::fs::read(&request.screenshot).await?;
        let body = GenerateBody {
            component_name: &request.component_name,
            semantic_type: request.kind,
            screenshot_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
            content: &request.content,
            design_tokens: request.design_tokens.as_ref(),
            model: self.config.model.as_deref(),
        };

        let mut call = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        debug!(
            component = %request.component_name,
            bytes = parsed.code.len(),
            "vision generation complete"
        );
        if parsed.code.trim().is_empty() {
            return Err(VisionError::EmptyResponse);
        }
        Ok(parsed.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_timeout() {
        let config: VisionConfig =
            serde_json::from_str(r#"{"endpoint": "http://localhost:9000/generate"}"#).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert!(HttpVisionGenerator::new(config).is_ok());
    }

    #[tokio::test]
    async fn missing_screenshot_is_io_error() {
        let generator = HttpVisionGenerator::new(VisionConfig {
            endpoint: "http://127.0.0.1:9/generate".into(),
            api_key: None,
            model: None,
            timeout_secs: 1,
        })
        .unwrap();
        let request = VisionRequest {
            component_name: "HeroPixel".into(),
            kind: SemanticType::Hero,
            screenshot: PathBuf::from("/nonexistent/hero.png"),
            content: ExtractedContent::default(),
            design_tokens: None,
        };
        let err = generator.generate(&request).await.unwrap_err();
        assert!(matches!(err, VisionError::Io(_)));
    }
}
