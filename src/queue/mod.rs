pub mod consumer;
pub mod publisher;
mod types;

pub use types::Job;

use crate::Result;
use lapin::options::QueueDeclareOptions;
use lapin::types::FieldTable;
use lapin::Channel;

/// Inbound queue carrying generation jobs.
pub const JOBS_QUEUE: &str = "llm_jobs";
/// Outbound queue carrying result events.
pub const RESULTS_QUEUE: &str = "llm_responses";

/// Declares both queues idempotently: non-durable, non-exclusive, no
/// auto-delete, matching what job producers and result consumers declare.
pub async fn declare_queues(channel: &Channel) -> Result<()> {
    for queue in [JOBS_QUEUE, RESULTS_QUEUE] {
        channel
            .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
            .await?;
    }
    Ok(())
}
