pub mod entities;
pub mod prompts;

pub use entities::*;
