use super::handlers::analyze::analyze;
use crate::application::{http::server::app_state::AppState, rate_limit_middleware::rate_limit};
use axum::{Router, middleware, routing::post};

pub fn analysis_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/analyze", state.args.server.root_path),
            post(analyze),
        )
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
}
