pub mod llm;
pub mod rate_limit;
pub mod upload;
