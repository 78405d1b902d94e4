pub mod analysis;
pub mod common;
pub mod ingredient;
pub mod llm;
pub mod rate_limit;
pub mod recipe;
pub mod retry;
pub mod upload;
