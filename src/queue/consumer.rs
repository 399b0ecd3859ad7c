use super::{Job, JOBS_QUEUE};
use crate::Result;
use futures_util::StreamExt;
use lapin::options::BasicConsumeOptions;
use lapin::types::FieldTable;
use lapin::Channel;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Subscribes to the job queue and feeds decoded jobs into the dispatch
/// channel.
///
/// The subscription uses automatic acknowledgment, so delivery is
/// at-most-once: a message is considered consumed the moment the broker
/// hands it over. Messages that fail to decode are logged and dropped.
/// The capacity-1 `jobs` channel is the only backpressure: while every
/// worker is busy the send suspends and further deliveries queue up
/// broker-side.
pub async fn run(channel: Channel, jobs: mpsc::Sender<Job>) -> Result<()> {
    let mut consumer = channel
        .basic_consume(
            JOBS_QUEUE,
            "llm-relay",
            BasicConsumeOptions {
                no_ack: true,
                ..BasicConsumeOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    info!(queue = JOBS_QUEUE, "consuming jobs");

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(error = %e, "broker delivery failed");
                continue;
            }
        };

        let job = match decode_job(&delivery.data) {
            Ok(job) => job,
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&delivery.data),
                    "dropping malformed job"
                );
                continue;
            }
        };

        if jobs.send(job).await.is_err() {
            // All workers are gone; nothing left to dispatch to.
            break;
        }
    }

    info!(queue = JOBS_QUEUE, "job consumer stopped");
    Ok(())
}

pub fn decode_job(data: &[u8]) -> Result<Job> {
    Ok(serde_json::from_slice(data)?)
}
