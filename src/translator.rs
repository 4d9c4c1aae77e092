//! Translation gateway.
//!
//! The pipeline only sees the [`Translator`] trait. [`DeepLTranslator`] is the
//! production implementation; it owns the HTTP client and the retry policy.

use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";
pub const DEFAULT_TARGET_LANG: &str = "JA";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    #[error("DeepL API key not configured")]
    MissingCredential,

    #[error("Translation provider error{}: {message}", status_suffix(.status))]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("Translation transport error: {0}")]
    Transport(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl TranslationError {
    /// Transport failures, rate limits and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::MissingCredential => false,
            TranslationError::Transport(_) => true,
            TranslationError::Provider { status, .. } => {
                matches!(status, Some(s) if *s == 429 || *s >= 500)
            }
        }
    }
}

/// A service that translates one string at a time.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, credential: &str) -> Result<String, TranslationError>;
}

/// DeepL `/v2/translate` response
#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: Option<String>,
}

/// Translator backed by the DeepL REST API.
#[derive(Debug, Clone)]
pub struct DeepLTranslator {
    client: reqwest::Client,
    api_url: String,
    target_lang: String,
    retry: RetryConfig,
}

impl DeepLTranslator {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            target_lang: target_lang.into(),
            retry: RetryConfig::deepl(),
        }
    }

    /// Replace the default retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request_once(&self, text: &str, credential: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", credential))
            .form(&[("text", text), ("target_lang", self.target_lang.as_str())])
            .send()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslationError::Provider {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let parsed: DeepLResponse =
            response.json().await.map_err(|e| TranslationError::Provider {
                status: None,
                message: format!("Failed to parse DeepL response: {}", e),
            })?;

        parsed
            .translations
            .into_iter()
            .next()
            .and_then(|t| t.text)
            .ok_or_else(|| TranslationError::Provider {
                status: None,
                message: "DeepL translation failed: unexpected response shape".to_string(),
            })
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate(&self, text: &str, credential: &str) -> Result<String, TranslationError> {
        if credential.trim().is_empty() {
            return Err(TranslationError::MissingCredential);
        }

        debug!("Translating {} chars to {}", text.chars().count(), self.target_lang);

        with_retry_if(
            &self.retry,
            &format!("DeepL translation to {}", self.target_lang),
            || self.request_once(text, credential),
            TranslationError::is_retryable,
        )
        .await
    }
}
