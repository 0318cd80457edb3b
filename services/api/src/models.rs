//! API models for request and response payloads

use common::{CaptionOptions, CaptionSet, MediaKind};
use serde::{Deserialize, Serialize};

use crate::status::SessionStatus;
use crate::store::StoreSnapshot;

pub mod media;

use self::media::{Asset, AssetId};

/// One asset as presented to clients
#[derive(Debug, Serialize)]
pub struct AssetView {
    pub id: AssetId,
    pub file_name: String,
    pub mime_type: String,
    pub media_kind: MediaKind,
    pub size: u64,
    pub preview_url: String,
    pub poster_url: String,
    pub captions: Option<CaptionSet>,
    pub selected: bool,
    pub active: bool,
}

impl AssetView {
    pub fn new(asset: &Asset, snapshot: &StoreSnapshot) -> Self {
        Self {
            id: asset.id.clone(),
            file_name: asset.source.file_name.clone(),
            mime_type: asset.source.mime_type.clone(),
            media_kind: asset.media_kind,
            size: asset.source.size,
            preview_url: asset.preview_url(),
            poster_url: asset.poster_url(),
            captions: asset.captions.clone(),
            selected: snapshot.is_selected(&asset.id),
            active: snapshot.active_id() == Some(&asset.id),
        }
    }
}

/// Full session view, also the payload of every `state` event
#[derive(Debug, Serialize)]
pub struct StateView {
    pub assets: Vec<AssetView>,
    pub selected_ids: Vec<AssetId>,
    pub active_id: Option<AssetId>,
    pub busy: bool,
    pub error: Option<String>,
}

impl StateView {
    pub fn new(snapshot: &StoreSnapshot, status: SessionStatus) -> Self {
        Self {
            assets: snapshot
                .assets()
                .map(|asset| AssetView::new(asset, snapshot))
                .collect(),
            selected_ids: snapshot.selected_ids(),
            active_id: snapshot.active_id().cloned(),
            busy: status.busy,
            error: status.error,
        }
    }
}

/// Response for a multipart upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ids: Vec<AssetId>,
}

/// Request to activate an asset and toggle its selection
#[derive(Debug, Default, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub additive: bool,
}

/// Request to caption a batch; ids default to the current selection
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub asset_ids: Option<Vec<AssetId>>,
    #[serde(default)]
    pub options: CaptionOptions,
}

/// Response for an accepted generation batch
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub asset_ids: Vec<AssetId>,
}

/// Request to replace the text of one caption
#[derive(Debug, Deserialize)]
pub struct EditCaptionRequest {
    pub text: String,
}
