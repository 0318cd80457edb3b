//! Upload ingestion: filter, persist, extract posters, register assets

use bytes::Bytes;
use chrono::{DateTime, Utc};
use common::MediaKind;
use futures::future::join_all;
use media::FrameExtractor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::media::{Asset, AssetId, SourceFile};
use crate::status::StatusTracker;
use crate::store::AssetStore;

/// One file received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub bytes: Bytes,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to process files. Please try again.")]
    Persist(#[source] std::io::Error),
}

/// Turns uploads into assets; files live in a directory removed at shutdown
#[derive(Clone)]
pub struct Ingestor {
    store: AssetStore,
    frames: Arc<dyn FrameExtractor>,
    status: StatusTracker,
    upload_dir: Arc<TempDir>,
}

impl Ingestor {
    pub fn new(
        store: AssetStore,
        frames: Arc<dyn FrameExtractor>,
        status: StatusTracker,
    ) -> std::io::Result<Self> {
        let upload_dir = tempfile::Builder::new()
            .prefix("kipton-uploads-")
            .tempdir()?;
        debug!("Session uploads stored in {}", upload_dir.path().display());

        Ok(Self {
            store,
            frames,
            status,
            upload_dir: Arc::new(upload_dir),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Ingest a batch, returning the new ids in input order.
    ///
    /// Unsupported MIME types are skipped. If nothing is accepted only the
    /// session error is cleared. Any persistence failure aborts the whole
    /// batch and removes the files its siblings already wrote.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<Vec<AssetId>, IngestError> {
        let accepted: Vec<(MediaKind, UploadedFile)> = files
            .into_iter()
            .filter_map(|file| match MediaKind::from_mime(&file.mime_type) {
                Some(kind) => Some((kind, file)),
                None => {
                    debug!(
                        "Skipping unsupported upload {} ({})",
                        file.file_name, file.mime_type
                    );
                    None
                }
            })
            .collect();

        if accepted.is_empty() {
            self.status.dismiss_error();
            return Ok(Vec::new());
        }

        let _busy = self.status.begin();
        let prepared = join_all(
            accepted
                .into_iter()
                .map(|(kind, file)| self.prepare(kind, file)),
        )
        .await;

        let mut assets = Vec::with_capacity(prepared.len());
        let mut failure = None;
        for result in prepared {
            match result {
                Ok(asset) => assets.push(asset),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            error!("Failed to ingest uploads: {:?}", e);
            for asset in &assets {
                if let Err(remove_error) = tokio::fs::remove_file(&asset.source.path).await {
                    warn!(
                        "Could not remove {}: {}",
                        asset.source.path.display(),
                        remove_error
                    );
                }
            }
            self.status.report_error(e.to_string());
            return Err(e);
        }

        let ids = self.store.ingest(assets);
        info!("Registered {} uploaded files", ids.len());
        Ok(ids)
    }

    async fn prepare(&self, kind: MediaKind, file: UploadedFile) -> Result<Asset, IngestError> {
        let last_modified = file.last_modified.unwrap_or_else(Utc::now);
        let extension = Path::new(&file.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let path = self
            .upload_dir
            .path()
            .join(format!("{}{}", Uuid::new_v4(), extension));

        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(IngestError::Persist)?;

        let poster = match kind {
            MediaKind::Image => None,
            MediaKind::Video => match self.frames.extract_frame(&path).await {
                Ok(frame) => Some(frame.jpeg),
                Err(e) => {
                    warn!("Could not generate video poster for {}: {}", file.file_name, e);
                    None
                }
            },
        };

        let source = Arc::new(SourceFile {
            path,
            mime_type: file.mime_type.trim().to_ascii_lowercase(),
            size: file.bytes.len() as u64,
            last_modified,
            file_name: file.file_name,
        });
        let id = AssetId::generate(&source.file_name, last_modified);

        Ok(Asset::new(id, source, kind, poster))
    }
}
