//! Application state shared across handlers

use media::{Captioner, FrameExtractor};
use std::sync::Arc;

use crate::ingest::Ingestor;
use crate::models::StateView;
use crate::orchestrator::GenerationOrchestrator;
use crate::status::StatusTracker;
use crate::store::AssetStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: AssetStore,
    pub status: StatusTracker,
    pub ingestor: Ingestor,
    pub orchestrator: GenerationOrchestrator,
}

impl AppState {
    /// Wire up a fresh session; fails only if the upload directory cannot be created
    pub fn new(
        frames: Arc<dyn FrameExtractor>,
        captioner: Arc<dyn Captioner>,
    ) -> std::io::Result<Self> {
        let store = AssetStore::new();
        let status = StatusTracker::new();
        let ingestor = Ingestor::new(store.clone(), frames, status.clone())?;
        let orchestrator = GenerationOrchestrator::new(store.clone(), captioner, status.clone());

        Ok(Self {
            store,
            status,
            ingestor,
            orchestrator,
        })
    }

    pub fn view(&self) -> StateView {
        StateView::new(&self.store.snapshot(), self.status.current())
    }
}
