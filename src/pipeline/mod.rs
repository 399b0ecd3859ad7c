pub mod worker;

use crate::config::Config;
use crate::llm::{GenerateClient, ResultEvent};
use crate::queue::{self, Job};
use crate::Result;
use futures_util::future::join_all;
use lapin::{Channel, Connection, ConnectionProperties};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A connected but not yet running pipeline.
///
/// The connection is established and both queues are declared before any
/// task starts; a failure here is fatal to the process, before any job has
/// been accepted. Consuming and publishing happen over separate channels so
/// each is driven by exactly one task.
pub struct Pipeline {
    connection: Connection,
    consume_channel: Channel,
    publish_channel: Channel,
}

impl Pipeline {
    pub async fn connect(config: &Config) -> Result<Self> {
        let options = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);

        let connection = Connection::connect(&config.broker_addr, options).await?;
        let consume_channel = connection.create_channel().await?;
        let publish_channel = connection.create_channel().await?;

        queue::declare_queues(&consume_channel).await?;

        info!("connected to broker");

        Ok(Self {
            connection,
            consume_channel,
            publish_channel,
        })
    }

    /// Spawns the publisher, the consumer, and the worker pool, in that
    /// order: the result conduit needs a consumer before any worker can
    /// produce into it, and workers come up last once both conduits are
    /// live. Both conduits have capacity 1, so a job handoff suspends until
    /// a worker is free.
    pub fn start(self, client: Arc<dyn GenerateClient>, worker_count: usize) -> PipelineHandle {
        let Self {
            connection,
            consume_channel,
            publish_channel,
        } = self;

        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>(1);
        let (results_tx, results_rx) = mpsc::channel::<ResultEvent>(1);

        let publisher = tokio::spawn(queue::publisher::run(publish_channel, results_rx));

        let consumer = tokio::spawn(async move {
            if let Err(e) = queue::consumer::run(consume_channel, jobs_tx).await {
                warn!(error = %e, "job consumer failed");
            }
        });

        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let workers = (0..worker_count.max(1))
            .map(|i| {
                info!(worker = i + 1, "starting worker");
                tokio::spawn(worker::run(
                    jobs_rx.clone(),
                    results_tx.clone(),
                    client.clone(),
                ))
            })
            .collect();
        drop(results_tx);

        PipelineHandle {
            connection,
            consumer,
            workers,
            publisher,
        }
    }
}

/// Handles to the running pipeline tasks, kept for shutdown.
pub struct PipelineHandle {
    connection: Connection,
    consumer: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    publisher: JoinHandle<()>,
}

impl PipelineHandle {
    /// Graceful shutdown: stop accepting deliveries, let in-flight jobs
    /// finish within the grace period, then close the broker connection.
    ///
    /// Aborting the consumer drops the job sender, so each worker exits
    /// after its current job; once the last worker drops its result sender
    /// the publisher drains what is left and exits too.
    pub async fn shutdown(mut self, grace: Duration) {
        info!("shutting down pipeline");

        self.consumer.abort();
        let _ = (&mut self.consumer).await;

        let drained = tokio::time::timeout(grace, async {
            join_all(self.workers.iter_mut()).await;
            let _ = (&mut self.publisher).await;
        })
        .await;

        if drained.is_err() {
            warn!(grace_secs = grace.as_secs(), "grace period elapsed with jobs still in flight");
            for worker in &self.workers {
                worker.abort();
            }
            self.publisher.abort();
        }

        if let Err(e) = self.connection.close(200, "shutting down").await {
            debug!(error = %e, "broker connection close failed");
        }

        info!("pipeline stopped");
    }
}
