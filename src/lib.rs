pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod queue;
pub mod shutdown;

pub use error::{Error, Result};
