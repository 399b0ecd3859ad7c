use super::RESULTS_QUEUE;
use crate::llm::ResultEvent;
use crate::{Error, Result};
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const PUBLISH_DEADLINE: Duration = Duration::from_secs(5);

/// Drains the result channel and publishes each event to the results queue
/// in receive order.
///
/// A failed or timed-out publish drops the event: retrying or blocking here
/// would stall the worker that is waiting to hand over its next chunk, and
/// downstream consumers already have to reassemble partial fragments.
pub async fn run(channel: Channel, mut results: mpsc::Receiver<ResultEvent>) {
    info!(queue = RESULTS_QUEUE, "publishing results");

    while let Some(event) = results.recv().await {
        if let Err(e) = publish(&channel, &event).await {
            warn!(chat_id = %event.chat_id, error = %e, "dropping result event");
        }
    }

    info!(queue = RESULTS_QUEUE, "result publisher stopped");
}

async fn publish(channel: &Channel, event: &ResultEvent) -> Result<()> {
    let payload = serde_json::to_vec(event)?;

    tokio::time::timeout(PUBLISH_DEADLINE, async {
        channel
            .basic_publish(
                "",
                RESULTS_QUEUE,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await
    })
    .await
    .map_err(|_| Error::PublishTimeout)??;

    debug!(chat_id = %event.chat_id, done = event.done, "published result event");
    Ok(())
}
