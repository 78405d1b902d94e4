use std::{fmt, path::PathBuf, time::Duration};

use rand::{Rng, distributions::Alphanumeric};
use url::Url;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError, llm::entities::ProviderKind, retry::RetryPolicy,
    upload::policies::UploadPolicy,
};

pub mod entities;
pub mod services;

#[derive(Clone, Debug)]
pub struct PantryChefConfig {
    pub llm: LLMConfig,
    pub upload: UploadConfig,
    pub analysis: AnalysisConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Clone)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    /// Explicit provider choice; `None` picks the direct provider first and
    /// falls back to the gateway.
    pub preferred_provider: Option<ProviderKind>,
    pub openai: ProviderCredentials,
    pub openrouter: ProviderCredentials,
    pub app_name: Option<String>,
    pub app_url: Option<String>,
    pub vision_model: Option<String>,
    pub recipe_model: Option<String>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

/// Provider settings after selection, ready to build a client from.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: Url,
    pub vision_model: String,
    pub recipe_model: String,
    pub app_name: Option<String>,
    pub app_url: Option<String>,
    pub request_timeout: Duration,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url.as_str())
            .field("vision_model", &self.vision_model)
            .field("recipe_model", &self.recipe_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl LLMConfig {
    pub fn resolve(&self) -> Result<ResolvedProvider, CoreError> {
        let kind = match self.preferred_provider {
            Some(kind) => {
                if !self.credentials(kind).has_key() {
                    return Err(CoreError::Configuration(format!(
                        "{} selected but {} is not set",
                        kind,
                        kind.api_key_variable()
                    )));
                }
                kind
            }
            None if self.openai.has_key() => ProviderKind::OpenAi,
            None if self.openrouter.has_key() => ProviderKind::OpenRouter,
            None => {
                return Err(CoreError::Configuration(format!(
                    "missing API key: set {} or {}",
                    ProviderKind::OpenAi.api_key_variable(),
                    ProviderKind::OpenRouter.api_key_variable()
                )));
            }
        };

        let credentials = self.credentials(kind);
        let base_url = Url::parse(credentials.base_url.trim_end_matches('/')).map_err(|e| {
            CoreError::Configuration(format!("invalid {} base URL: {}", kind, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CoreError::Configuration(format!(
                "{} base URL must use http or https",
                kind
            )));
        }

        Ok(ResolvedProvider {
            kind,
            api_key: credentials.api_key.trim().to_string(),
            base_url,
            vision_model: self
                .vision_model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            recipe_model: self
                .recipe_model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            app_name: self.app_name.clone(),
            app_url: self.app_url.clone(),
            request_timeout: self.request_timeout,
        })
    }

    fn credentials(&self, kind: ProviderKind) -> &ProviderCredentials {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::OpenRouter => &self.openrouter,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_file_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub max_images: usize,
}

impl UploadConfig {
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.max_file_bytes,
            self.allowed_extensions.clone(),
            self.max_images,
        )
    }
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub max_recipes: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_recipes: 3 }
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_hour: u32,
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

/// Time-ordered id, so staged files and log lines sort by arrival.
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
