use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::http::server::{api_entities::response::Response, app_state::AppState};

/// Limits the frontend needs to validate a form before sending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublicConfig {
    pub max_recipes: u32,
    pub max_images: usize,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    #[schema(example = "openai")]
    pub provider: String,
}

#[utoipa::path(
    get,
    path = "/config",
    tag = "system",
    summary = "Public upload and recipe limits",
    responses(
        (status = 200, body = PublicConfig)
    ),
)]
pub async fn get_config(State(state): State<AppState>) -> Response<PublicConfig> {
    let policy = state.service.upload_policy();

    Response::OK(PublicConfig {
        max_recipes: state.service.max_recipes(),
        max_images: policy.max_images(),
        max_upload_bytes: policy.max_file_bytes(),
        allowed_extensions: policy.allowed_extensions().to_vec(),
        provider: state.service.provider_name().to_string(),
    })
}
