use std::future::Future;

use crate::domain::{common::entities::app_errors::CoreError, llm::entities::EncodedImage};

/// LLM Client trait for calling AI models
#[cfg_attr(test, mockall::automock)]
pub trait LLMClient: Send + Sync {
    /// Sends one instruction plus one image to the vision model.
    fn generate_with_image(
        &self,
        instruction: String,
        image: EncodedImage,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Sends a system prompt and a user prompt to the recipe model.
    fn generate_with_text(
        &self,
        system_prompt: String,
        prompt: String,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn provider_name(&self) -> &'static str;

    fn vision_model(&self) -> &str;

    fn recipe_model(&self) -> &str;
}
