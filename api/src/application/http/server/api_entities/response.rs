use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub enum Response<T: Serialize> {
    OK(T),
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::OK(body) => (StatusCode::OK, Json(body)).into_response(),
        }
    }
}

/// Body of every `/analyze` reply, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[schema(example = json!(["tomate", "cebolla", "ajo"]))]
    pub ingredients: Vec<String>,
    /// One HTML card per recipe.
    pub recipes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyzeResponse {
    pub fn success(ingredients: Vec<String>, recipes: Vec<String>) -> Self {
        Self {
            success: true,
            ingredients,
            recipes,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            ingredients: Vec::new(),
            recipes: Vec::new(),
            error: Some(error.into()),
        }
    }
}
