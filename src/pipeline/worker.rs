use crate::llm::{GenerateClient, GenerateRequest, ResultEvent};
use crate::queue::Job;
use crate::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

/// Worker loop: take the next job off the shared receiver, process it to
/// completion, repeat. The receiver lock is held only across `recv`, so one
/// job is in flight per worker and a slow generation never blocks the
/// handoff for the other workers.
///
/// Job failures are logged and swallowed: an unreachable endpoint must not
/// take the pool down.
pub async fn run(
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<ResultEvent>,
    client: Arc<dyn GenerateClient>,
) {
    loop {
        let job = {
            let mut rx = jobs.lock().await;
            match rx.recv().await {
                Some(job) => job,
                None => break,
            }
        };

        let chat_id = job.chat_id.clone();
        if let Err(e) = process_job(client.as_ref(), &results, job).await {
            error!(chat_id = %chat_id, error = %e, "job failed");
        }
    }
}

/// Drives one job through the model client, re-stamping the originating
/// chat id onto every event before forwarding it. The endpoint knows
/// nothing about the correlation id, so whatever it reports is overwritten.
pub async fn process_job(
    client: &dyn GenerateClient,
    results: &mpsc::Sender<ResultEvent>,
    job: Job,
) -> Result<()> {
    let chat_id = job.chat_id.clone();
    let request = GenerateRequest::from(job);

    let (events_tx, mut events_rx) = mpsc::channel::<ResultEvent>(1);

    let forward = async {
        while let Some(mut event) = events_rx.recv().await {
            event.chat_id = chat_id.clone();
            debug!(chat_id = %event.chat_id, done = event.done, "forwarding result event");
            if results.send(event).await.is_err() {
                break;
            }
        }
    };

    // generate owns the sender, so forward ends when the stream does.
    let (generated, ()) = tokio::join!(client.generate(request, events_tx), forward);
    generated
}
