use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use pantrychef_core::domain::rate_limit::ports::{RateLimitDecision, RateLimiter};
use tracing::warn;

use crate::application::http::server::{api_entities::api_error::ApiError, app_state::AppState};

/// Rejects requests from clients over their `/analyze` budget
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_id = client_id(
        req.headers(),
        peer,
        state.args.server.trust_forwarded_for,
    );

    match state.rate_limiter.check(&client_id) {
        RateLimitDecision::Allowed => next.run(req).await,
        RateLimitDecision::Limited { retry_after } => {
            // Round up so clients never retry a little too early.
            let retry_after_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            warn!(client_id = %client_id, retry_after_secs, "Rate limit exceeded");
            ApiError::TooManyRequests { retry_after_secs }.into_response()
        }
    }
}

/// First `X-Forwarded-For` hop when the proxy is trusted, else the peer
/// address, else `unknown`.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
    {
        return forwarded.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
