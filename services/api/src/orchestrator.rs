//! Batch caption generation
//!
//! Every asset in a batch is captioned concurrently. Each result is merged as
//! soon as it arrives, so one failure never discards its siblings' captions.

use common::CaptionOptions;
use futures::FutureExt;
use media::Captioner;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::models::media::AssetId;
use crate::status::StatusTracker;
use crate::store::AssetStore;

const ABORTED_MESSAGE: &str = "Failed to generate captions. Please try again.";

/// What happened to each asset of a batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<AssetId>,
    pub failed: Vec<(AssetId, String)>,
    /// Ids no longer present when the batch was dispatched
    pub skipped: Vec<AssetId>,
    /// The error surfaced to the session, if any
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct GenerationOrchestrator {
    store: AssetStore,
    captioner: Arc<dyn Captioner>,
    status: StatusTracker,
}

impl GenerationOrchestrator {
    pub fn new(store: AssetStore, captioner: Arc<dyn Captioner>, status: StatusTracker) -> Self {
        Self {
            store,
            captioner,
            status,
        }
    }

    /// Start a batch in the background.
    ///
    /// The session is marked busy (and its error cleared) before this returns,
    /// and stays busy until every request has settled.
    pub fn run(&self, asset_ids: Vec<AssetId>, options: CaptionOptions) -> JoinHandle<BatchOutcome> {
        let busy = self.status.begin();
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let outcome = orchestrator.run_batch(asset_ids, options).await;
            drop(busy);
            outcome
        })
    }

    async fn run_batch(&self, asset_ids: Vec<AssetId>, options: CaptionOptions) -> BatchOutcome {
        let snapshot = self.store.snapshot();
        let options = Arc::new(options);
        let mut outcome = BatchOutcome::default();
        let mut tasks = JoinSet::new();

        for id in asset_ids {
            let Some(asset) = snapshot.get(&id) else {
                warn!("Skipping caption generation for unknown asset {}", id);
                outcome.skipped.push(id);
                continue;
            };

            let source = asset.media_source();
            let captioner = self.captioner.clone();
            let store = self.store.clone();
            let options = options.clone();

            tasks.spawn(async move {
                let generated = AssertUnwindSafe(captioner.generate(&source, &options))
                    .catch_unwind()
                    .await;
                match generated {
                    Ok(Ok(captions)) => {
                        store.merge_captions(&id, captions);
                        (id, Ok(()))
                    }
                    Ok(Err(e)) => (id, Err(e.to_string())),
                    Err(_) => {
                        error!("Caption request for {} panicked", id);
                        (id, Err(ABORTED_MESSAGE.to_string()))
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(()))) => {
                    info!("Captions ready for {}", id);
                    outcome.succeeded.push(id);
                }
                Ok((id, Err(message))) => {
                    error!("Caption generation failed for {}: {}", id, message);
                    outcome.error.get_or_insert_with(|| message.clone());
                    outcome.failed.push((id, message));
                }
                Err(e) => {
                    error!("Caption task aborted: {}", e);
                    outcome
                        .error
                        .get_or_insert_with(|| ABORTED_MESSAGE.to_string());
                }
            }
        }

        if let Some(message) = &outcome.error {
            self.status.report_error(message.clone());
        }

        info!(
            "Caption batch finished: {} succeeded, {} failed, {} skipped",
            outcome.succeeded.len(),
            outcome.failed.len(),
            outcome.skipped.len()
        );
        outcome
    }
}
