use serde::{Deserialize, Serialize};

/// One generation job read from the inbound queue.
///
/// ```json
/// {
///   "chat_id": "100",
///   "model": "mistral",
///   "prompt": "what is your name?"
/// }
/// ```
///
/// `chat_id`, `model` and `prompt` are required; a message missing any of
/// them does not decode and is dropped by the consumer. The remaining fields
/// override the endpoint's defaults for this job only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub chat_id: String,
    pub model: String,
    pub prompt: String,

    #[serde(default)]
    pub context: Option<Vec<i64>>,
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}
