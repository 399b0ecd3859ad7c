use async_trait::async_trait;
use llm_relay::llm::{GenerateClient, GenerateRequest, ResultEvent};
use llm_relay::{Error, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Barrier};
use tokio::time::Instant;

/// Scripted model client for pipeline tests: records every request and
/// replays a fixed event sequence, optionally stalling first.
pub struct MockGenerateClient {
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
    events: Vec<ResultEvent>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    error: Option<String>,
    spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
}

impl MockGenerateClient {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            events: Vec::new(),
            delay: None,
            barrier: None,
            error: None,
            spans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_events(mut self, events: Vec<ResultEvent>) -> Self {
        self.events = events;
        self
    }

    /// Simulates generation time so tests can observe sequencing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All participants must be generating at once for any to proceed.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// (start, end) of each completed generate call, in completion order.
    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.lock().unwrap().clone()
    }
}

impl Default for MockGenerateClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerateClient for MockGenerateClient {
    async fn generate(
        &self,
        request: GenerateRequest,
        events: mpsc::Sender<ResultEvent>,
    ) -> Result<()> {
        let start = Instant::now();
        self.requests.lock().unwrap().push(request);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(Error::llm(error.clone()));
        }

        for event in self.events.clone() {
            if events.send(event).await.is_err() {
                break;
            }
        }

        self.spans.lock().unwrap().push((start, Instant::now()));
        Ok(())
    }
}
