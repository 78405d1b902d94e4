use std::sync::Arc;

use pantrychef_core::{
    application::PantryChefService, infrastructure::rate_limit::in_memory::InMemoryRateLimiter,
};

use crate::args::Args;

#[derive(Clone)]
pub struct AppState {
    pub args: Arc<Args>,
    pub service: PantryChefService,
    pub rate_limiter: Arc<InMemoryRateLimiter>,
}

impl AppState {
    pub fn new(
        args: Arc<Args>,
        service: PantryChefService,
        rate_limiter: InMemoryRateLimiter,
    ) -> Self {
        Self {
            args,
            service,
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
