use crate::queue::Job;
use serde::{Deserialize, Serialize};

/// Request body for the endpoint's `/api/generate` route.
///
/// Optional fields follow the endpoint's contract: `system` and `template`
/// override what the model's own configuration defines, `context` carries
/// the token state returned by a previous generation, `stream: false` asks
/// for a single response object instead of a chunk stream, and `raw`
/// disables prompt templating entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub chat_id: String,
    pub model: String,
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
}

impl From<Job> for GenerateRequest {
    fn from(job: Job) -> Self {
        Self {
            chat_id: job.chat_id,
            model: job.model,
            prompt: job.prompt,
            format: None,
            system: job.system_prompt,
            template: job.prompt_template,
            context: job.context,
            stream: None,
            raw: None,
        }
    }
}

/// One decoded line of the endpoint's newline-delimited response stream.
///
/// Every field defaults on decode: partial chunks omit the performance
/// counters and the final context, and the endpoint never sets `chat_id`
/// (the pipeline re-stamps it from the originating job before publishing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub context: Vec<i64>,
    #[serde(default)]
    pub total_duration: i64,
    #[serde(default)]
    pub load_duration: i64,
    #[serde(default)]
    pub prompt_eval_count: i64,
    #[serde(default)]
    pub eval_count: i64,
    #[serde(default)]
    pub eval_duration: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_generate_request_omits_unset_fields() {
        let request = GenerateRequest {
            chat_id: "42".to_string(),
            model: "mistral".to_string(),
            prompt: "what is your name?".to_string(),
            format: None,
            system: None,
            template: None,
            context: None,
            stream: None,
            raw: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"chat_id": "42", "model": "mistral", "prompt": "what is your name?"})
        );
    }

    #[test]
    fn test_generate_request_from_job_maps_overrides() {
        let job = Job {
            chat_id: "100".to_string(),
            model: "mistral".to_string(),
            prompt: "hello".to_string(),
            context: Some(vec![1, 2, 3]),
            prompt_template: Some("{{ .Prompt }}".to_string()),
            system_prompt: Some("be terse".to_string()),
        };

        let request = GenerateRequest::from(job);
        assert_eq!(request.chat_id, "100");
        assert_eq!(request.model, "mistral");
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.system.as_deref(), Some("be terse"));
        assert_eq!(request.template.as_deref(), Some("{{ .Prompt }}"));
        assert_eq!(request.context, Some(vec![1, 2, 3]));
        assert_eq!(request.format, None);
        assert_eq!(request.stream, None);
        assert_eq!(request.raw, None);
    }

    #[test]
    fn test_result_event_decodes_partial_chunk() {
        let event: ResultEvent = serde_json::from_str(
            r#"{"model":"mistral","created_at":"2024-01-01T00:00:00Z","response":"Hi","done":false}"#,
        )
        .unwrap();

        assert_eq!(event.chat_id, "");
        assert_eq!(event.response, "Hi");
        assert!(!event.done);
        assert!(event.context.is_empty());
        assert_eq!(event.eval_count, 0);
    }

    #[test]
    fn test_result_event_serializes_all_fields() {
        let event = ResultEvent {
            chat_id: "7".to_string(),
            model: "mistral".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            response: "".to_string(),
            done: true,
            context: vec![5, 6],
            total_duration: 900,
            load_duration: 100,
            prompt_eval_count: 4,
            eval_count: 12,
            eval_duration: 800,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["chat_id"], "7");
        assert_eq!(value["done"], true);
        assert_eq!(value["context"], json!([5, 6]));
        // Zero-valued counters still appear on the wire.
        assert_eq!(value["response"], "");
        assert_eq!(value["total_duration"], 900);
    }
}
