pub mod entities;
pub mod formatter;
pub mod prompts;

pub use entities::*;
