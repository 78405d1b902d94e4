use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{
    common::{ResolvedProvider, entities::app_errors::CoreError},
    llm::{
        entities::{EncodedImage, ProviderKind},
        ports::LLMClient,
    },
};

const VISION_MAX_TOKENS: u32 = 2000;
const RECIPE_MAX_TOKENS: u32 = 2500;
const RECIPE_TEMPERATURE: f32 = 0.8;
/// Longest slice of a provider error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 500;

/// Client for the OpenAI chat/completions contract, shared by the direct
/// provider and the OpenRouter gateway.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    kind: ProviderKind,
    api_key: String,
    endpoint: String,
    vision_model: String,
    recipe_model: String,
    app_name: Option<String>,
    app_url: Option<String>,
    client: Client,
}

impl fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("vision_model", &self.vision_model)
            .field("recipe_model", &self.recipe_model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ChatCompletionsClient {
    pub fn new(provider: ResolvedProvider) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(provider.request_timeout)
            .build()
            .map_err(|e| CoreError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/chat/completions",
            provider.base_url.as_str().trim_end_matches('/')
        );

        tracing::info!(
            provider = %provider.kind,
            endpoint = %endpoint,
            vision_model = %provider.vision_model,
            recipe_model = %provider.recipe_model,
            "Initializing chat completions client"
        );

        Ok(Self {
            kind: provider.kind,
            api_key: provider.api_key,
            endpoint,
            vision_model: provider.vision_model,
            recipe_model: provider.recipe_model,
            app_name: provider.app_name,
            app_url: provider.app_url,
            client,
        })
    }

    async fn call_chat_api(&self, request: ChatRequest) -> Result<String, CoreError> {
        let model = request.model.clone();

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request);
        if self.kind == ProviderKind::OpenRouter {
            if let Some(app_url) = &self.app_url {
                builder = builder.header("HTTP-Referer", app_url);
            }
            if let Some(app_name) = &self.app_name {
                builder = builder.header("X-Title", app_name);
            }
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.kind, model = %model, error = %e, "Chat completions request failed");
            self.request_error(&model, &e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(provider = %self.kind, model = %model, error = %e, "Failed to read chat completions body");
            self.request_error(&model, &e)
        })?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!(
                provider = %self.kind,
                model = %model,
                status = status.as_u16(),
                message = %message,
                "Chat completions API error"
            );
            return Err(self.status_error(&model, status, message));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(provider = %self.kind, model = %model, error = %e, "Failed to parse chat completions response");
            CoreError::Parse(format!("invalid chat completions response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CoreError::Parse("no message content in response".to_string()))
    }

    fn request_error(&self, model: &str, e: &reqwest::Error) -> CoreError {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            "connection failed".to_string()
        } else {
            e.to_string()
        };

        if e.is_builder() {
            CoreError::ProviderFatal {
                provider: self.kind.to_string(),
                model: model.to_string(),
                status: None,
                message,
            }
        } else {
            CoreError::ProviderTransient {
                provider: self.kind.to_string(),
                model: model.to_string(),
                status: None,
                message,
            }
        }
    }

    fn status_error(&self, model: &str, status: StatusCode, message: String) -> CoreError {
        let provider = self.kind.to_string();
        let model = model.to_string();
        let status_code = Some(status.as_u16());
        if is_transient_status(status) {
            CoreError::ProviderTransient {
                provider,
                model,
                status: status_code,
                message,
            }
        } else {
            CoreError::ProviderFatal {
                provider,
                model,
                status: status_code,
                message,
            }
        }
    }
}

/// Timeouts, conflicts, throttling and server-side failures are worth
/// retrying; any other non-2xx status is a problem with the request itself.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
}

fn error_message(body: &str) -> String {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
        return error_response.error.message;
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

fn vision_request(model: &str, instruction: String, image: &EncodedImage) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: instruction },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
        }],
        max_tokens: VISION_MAX_TOKENS,
        temperature: None,
    }
}

fn recipe_request(model: &str, system_prompt: String, prompt: String) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            Message {
                role: "system",
                content: MessageContent::Text(system_prompt),
            },
            Message {
                role: "user",
                content: MessageContent::Text(prompt),
            },
        ],
        max_tokens: RECIPE_MAX_TOKENS,
        temperature: Some(RECIPE_TEMPERATURE),
    }
}

impl LLMClient for ChatCompletionsClient {
    async fn generate_with_image(
        &self,
        instruction: String,
        image: EncodedImage,
    ) -> Result<String, CoreError> {
        let request = vision_request(&self.vision_model, instruction, &image);
        self.call_chat_api(request).await
    }

    async fn generate_with_text(
        &self,
        system_prompt: String,
        prompt: String,
    ) -> Result<String, CoreError> {
        let request = recipe_request(&self.recipe_model, system_prompt, prompt);
        self.call_chat_api(request).await
    }

    fn provider_name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn vision_model(&self) -> &str {
        &self.vision_model
    }

    fn recipe_model(&self) -> &str {
        &self.recipe_model
    }
}
