mod client;
mod types;

pub use client::{GenerateClient, OllamaClient};
pub use types::{GenerateRequest, ResultEvent};
