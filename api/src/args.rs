use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use pantrychef_core::domain::{
    common::{
        AnalysisConfig, LLMConfig, PantryChefConfig, ProviderCredentials, RateLimitConfig,
        UploadConfig,
    },
    llm::entities::ProviderKind,
    retry::RetryPolicy,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "pantrychef", author, version, about = "Fridge photo to recipes API")]
pub struct Args {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub upload: UploadArgs,

    #[command(flatten)]
    pub rate_limit: RateLimitArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ServerArgs {
    #[arg(long, env, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env, default_value_t = 5000)]
    pub port: u16,

    /// Prefix for every route, e.g. `/api`
    #[arg(long, env, default_value = "")]
    pub root_path: String,

    #[arg(long, env, value_delimiter = ',', default_value = "http://localhost:5000")]
    pub allowed_origins: Vec<String>,

    /// Use the first `X-Forwarded-For` hop as the client address
    #[arg(long, env)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    Openai,
    Openrouter,
}

impl From<AiProvider> for ProviderKind {
    fn from(provider: AiProvider) -> Self {
        match provider {
            AiProvider::Openai => ProviderKind::OpenAi,
            AiProvider::Openrouter => ProviderKind::OpenRouter,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct LlmArgs {
    /// Force a provider instead of picking the first one with a key
    #[arg(long, env, value_enum)]
    pub ai_provider: Option<AiProvider>,

    #[arg(long, env, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env, default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env, hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    #[arg(long, env, default_value = "https://openrouter.ai/api/v1")]
    pub openrouter_base_url: String,

    #[arg(long, env)]
    pub openrouter_app_name: Option<String>,

    #[arg(long, env)]
    pub openrouter_app_url: Option<String>,

    /// Vision model; defaults to the provider's gpt-4o-mini
    #[arg(long, env)]
    pub image_model: Option<String>,

    /// Recipe model; defaults to the provider's gpt-4o-mini
    #[arg(long, env)]
    pub recipe_model: Option<String>,

    #[arg(long, env, default_value_t = 45)]
    pub llm_timeout_secs: u64,

    #[arg(long, env, default_value_t = 3)]
    pub llm_max_attempts: u32,

    #[arg(long, env, default_value_t = 1000)]
    pub llm_retry_initial_delay_ms: u64,
}

#[derive(Debug, Clone, clap::Args)]
pub struct UploadArgs {
    /// Per-image size limit, e.g. `16MiB` or `500KB`
    #[arg(long, env, default_value = "16MiB", value_parser = parse_size)]
    pub max_content_length: usize,

    #[arg(long, env, value_delimiter = ',', default_values = ["png", "jpg", "jpeg"])]
    pub allowed_extensions: Vec<String>,

    #[arg(long, env, default_value = "temp_uploads")]
    pub upload_folder: PathBuf,

    #[arg(long, env, default_value_t = 5)]
    pub max_images: usize,

    #[arg(long, env, default_value_t = 3)]
    pub max_recipes: u32,
}

impl UploadArgs {
    /// Largest accepted request body: every image at its limit plus room
    /// for the text fields and multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_content_length
            .saturating_mul(self.max_images.max(1))
            .saturating_add(1024 * 1024)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct RateLimitArgs {
    /// Requests per client per minute on `/analyze`; 0 disables
    #[arg(long, env, default_value_t = 10)]
    pub rate_limit_per_minute: u32,

    /// Requests per client per hour on `/analyze`; 0 disables
    #[arg(long, env, default_value_t = 100)]
    pub rate_limit_per_hour: u32,
}

#[derive(Debug, Clone, clap::Args)]
pub struct LogArgs {
    /// `tracing` filter directive, e.g. `info` or `pantrychef_core=debug`
    #[arg(long, env, default_value = "info")]
    pub log_level: String,

    #[arg(long, env)]
    pub log_json: bool,
}

/// Parses a byte size given as plain digits or with a `K`, `M`, `KB`, `MB`,
/// `KiB` or `MiB` suffix (all binary multiples).
pub fn parse_size(value: &str) -> Result<usize, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let number: usize = digits
        .parse()
        .map_err(|_| format!("invalid size '{}'", value))?;
    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        other => return Err(format!("unknown size unit '{}'", other)),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{}' is too large", value))
}

impl From<Args> for PantryChefConfig {
    fn from(args: Args) -> Self {
        let llm = args.llm;
        PantryChefConfig {
            llm: LLMConfig {
                preferred_provider: llm.ai_provider.map(ProviderKind::from),
                openai: ProviderCredentials::new(
                    llm.openai_api_key.unwrap_or_default(),
                    llm.openai_base_url,
                ),
                openrouter: ProviderCredentials::new(
                    llm.openrouter_api_key.unwrap_or_default(),
                    llm.openrouter_base_url,
                ),
                app_name: llm.openrouter_app_name,
                app_url: llm.openrouter_app_url,
                vision_model: llm.image_model.filter(|m| !m.trim().is_empty()),
                recipe_model: llm.recipe_model.filter(|m| !m.trim().is_empty()),
                request_timeout: Duration::from_secs(llm.llm_timeout_secs),
                retry: RetryPolicy::new(
                    llm.llm_max_attempts,
                    Duration::from_millis(llm.llm_retry_initial_delay_ms),
                ),
            },
            upload: UploadConfig {
                upload_dir: args.upload.upload_folder,
                max_file_bytes: args.upload.max_content_length,
                allowed_extensions: args.upload.allowed_extensions,
                max_images: args.upload.max_images,
            },
            analysis: AnalysisConfig {
                max_recipes: args.upload.max_recipes,
            },
            rate_limit: RateLimitConfig {
                per_minute: args.rate_limit.rate_limit_per_minute,
                per_hour: args.rate_limit.rate_limit_per_hour,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1024"), Ok(1024));
        assert_eq!(parse_size("16MiB"), Ok(16 * 1024 * 1024));
        assert_eq!(parse_size("16M"), Ok(16 * 1024 * 1024));
        assert_eq!(parse_size("500 KB"), Ok(500 * 1024));
        assert_eq!(parse_size(" 2k "), Ok(2048));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("10GB").is_err());
        assert!(parse_size("-5").is_err());
    }

    #[test]
    fn test_flags_build_config() {
        let args = Args::try_parse_from([
            "pantrychef",
            "--ai-provider",
            "openrouter",
            "--openrouter-api-key",
            "sk-or",
            "--max-content-length",
            "2MB",
            "--allowed-extensions",
            "png,webp",
            "--max-images",
            "2",
            "--max-recipes",
            "4",
            "--llm-max-attempts",
            "5",
            "--rate-limit-per-minute",
            "7",
        ])
        .unwrap();

        assert_eq!(args.upload.body_limit(), 2 * 2 * 1024 * 1024 + 1024 * 1024);

        let config = PantryChefConfig::from(args);
        assert_eq!(config.llm.preferred_provider, Some(ProviderKind::OpenRouter));
        assert_eq!(config.llm.openrouter.api_key, "sk-or");
        assert_eq!(config.llm.retry.max_attempts(), 5);
        assert_eq!(config.upload.max_file_bytes, 2 * 1024 * 1024);
        assert_eq!(config.upload.allowed_extensions, vec!["png", "webp"]);
        assert_eq!(config.analysis.max_recipes, 4);
        assert_eq!(config.rate_limit.per_minute, 7);
    }
}
