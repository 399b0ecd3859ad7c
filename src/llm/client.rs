use super::types::{GenerateRequest, ResultEvent};
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Seam for the model endpoint so the pipeline can be driven by a scripted
/// client in tests.
#[async_trait]
pub trait GenerateClient: Send + Sync {
    /// Issues one generation request and emits each decoded chunk through
    /// `events` as soon as it arrives. Returns once the endpoint signals
    /// completion or closes the stream.
    async fn generate(
        &self,
        request: GenerateRequest,
        events: mpsc::Sender<ResultEvent>,
    ) -> Result<()>;
}

/// HTTP client for an Ollama-compatible `/api/generate` endpoint speaking
/// newline-delimited JSON.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GenerateClient for OllamaClient {
    async fn generate(
        &self,
        request: GenerateRequest,
        events: mpsc::Sender<ResultEvent>,
    ) -> Result<()> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(chat_id = %request.chat_id, model = %request.model, "sending generate request");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::llm(format!(
                "generate request failed with status {status}"
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if emit_line(&line[..pos], &events).await {
                    return Ok(());
                }
            }
        }

        // The endpoint may close the stream without terminating the last line.
        if !buf.is_empty() {
            emit_line(&buf, &events).await;
        }

        Ok(())
    }
}

/// Decodes a single response line and forwards it. Returns true when the
/// stream is finished, either because the endpoint flagged completion or
/// because the receiving side went away.
async fn emit_line(line: &[u8], events: &mpsc::Sender<ResultEvent>) -> bool {
    if line.iter().all(u8::is_ascii_whitespace) {
        return false;
    }

    let event: ResultEvent = match serde_json::from_slice(line) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, line = %String::from_utf8_lossy(line), "skipping unparseable response line");
            return false;
        }
    };

    let done = event.done;
    if events.send(event).await.is_err() {
        return true;
    }
    done
}
