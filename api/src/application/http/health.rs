use axum::{Router, routing::get};

use crate::application::http::server::app_state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    summary = "Liveness probe",
    responses(
        (status = 200, description = "Service is up", body = String)
    ),
)]
pub async fn health() -> &'static str {
    "OK"
}

pub fn health_routes(root_path: &str) -> Router<AppState> {
    Router::new().route(&format!("{}/health", root_path), get(health))
}
