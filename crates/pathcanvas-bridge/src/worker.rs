use async_channel::{Receiver, Sender};
use path_canvas::sync::{SyncEnvelope, SyncOutcome, SyncSink};
use std::sync::Arc;

use crate::client::ApiClient;

/// Forwards editor requests into the worker's queue.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<SyncEnvelope>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SyncEnvelope>) -> Self {
        Self { tx }
    }

    /// Stops the worker once the queued requests are drained.
    pub fn close(&self) -> bool {
        self.tx.close()
    }
}

impl SyncSink for ChannelSink {
    fn submit(&self, envelope: SyncEnvelope) {
        // Unbounded, so this only fails once the worker is gone.
        if let Err(e) = self.tx.try_send(envelope) {
            let envelope = e.into_inner();
            tracing::error!(
                seq = envelope.seq,
                op = envelope.request.op(),
                "Sync worker closed, dropping request"
            );
        }
    }
}

/// Executes queued requests against the API.
///
/// Each request runs as its own task, so responses may settle out of order. The
/// editor's ledger sorts out which outcomes are still current.
pub struct SyncWorker {
    client: Arc<ApiClient>,
    requests: Receiver<SyncEnvelope>,
    outcomes: Sender<SyncOutcome>,
}

impl SyncWorker {
    pub fn new(
        client: Arc<ApiClient>,
        requests: Receiver<SyncEnvelope>,
        outcomes: Sender<SyncOutcome>,
    ) -> Self {
        Self {
            client,
            requests,
            outcomes,
        }
    }

    pub async fn run(self) {
        while let Ok(envelope) = self.requests.recv().await {
            let client = self.client.clone();
            let outcomes = self.outcomes.clone();
            tokio::spawn(async move {
                let outcome = match client.execute(&envelope).await {
                    Ok(seq) => SyncOutcome {
                        entity: envelope.request.entity(),
                        seq,
                        result: Ok(()),
                    },
                    Err(e) => {
                        tracing::warn!(
                            seq = envelope.seq,
                            op = envelope.request.op(),
                            error = %e,
                            "Sync request failed"
                        );
                        SyncOutcome::failure(&envelope, e.to_string())
                    }
                };
                if outcomes.send(outcome).await.is_err() {
                    tracing::debug!(seq = envelope.seq, "Outcome receiver dropped");
                }
            });
        }
        tracing::debug!("Sync worker stopped");
    }
}
