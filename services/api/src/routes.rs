//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    middleware,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use common::CaptionSlot;
use futures::Stream;
use serde_json::json;
use std::sync::Arc;
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::error;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    export::{content_disposition, render_caption_text},
    ingest::UploadedFile,
    middleware::log_requests,
    models::{
        AssetView, EditCaptionRequest, GenerateRequest, GenerateResponse, SelectRequest,
        UploadResponse,
        media::{Asset, AssetId},
    },
};

/// Create the router for the API service
pub fn create_router(state: AppState, upload_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/state", get(get_state))
        .route("/events", get(events))
        .route(
            "/assets",
            post(upload_assets).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/assets/:id", get(get_asset))
        .route("/assets/:id/preview", get(asset_preview))
        .route("/assets/:id/poster", get(asset_poster))
        .route("/assets/:id/select", post(select_asset))
        .route("/assets/:id/captions/:slot", put(edit_caption))
        .route("/assets/:id/captions.txt", get(caption_text))
        .route("/assets/:id/captions/download", get(download_captions))
        .route("/generate", post(generate))
        .route("/status/error", delete(dismiss_error))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

fn find_asset(state: &AppState, id: &AssetId) -> ApiResult<Arc<Asset>> {
    state
        .store
        .snapshot()
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Asset {} not found", id)))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "kipton-api"
    }))
}

/// Full session view
pub async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.view())
}

/// Stream a `state` event after every store or status change
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let store_changes = WatchStream::new(state.store.subscribe()).map(|_| ());
    let status_changes = WatchStream::new(state.status.subscribe()).map(|_| ());

    let stream = store_changes
        .merge(status_changes)
        .map(move |_| Event::default().event("state").json_data(state.view()));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// File modification time in Unix milliseconds
fn parse_last_modified(text: &str) -> ApiResult<DateTime<Utc>> {
    text.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid last_modified: {}", text)))
}

/// Multipart upload of one or more `file` fields.
///
/// A `last_modified` field (Unix milliseconds) applies to the `file` field
/// just before it.
pub async fn upload_assets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("last_modified") {
            let text = field.text().await.map_err(multipart_error)?;
            let last_modified = parse_last_modified(&text)?;
            match files.last_mut() {
                Some(file) => file.last_modified = Some(last_modified),
                None => {
                    return Err(ApiError::BadRequest(
                        "last_modified must follow a file field".to_string(),
                    ));
                }
            }
            continue;
        }
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        files.push(UploadedFile {
            file_name,
            mime_type,
            last_modified: None,
            bytes,
        });
    }

    let ids = state.ingestor.ingest(files).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { ids })))
}

/// One asset view
pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
) -> ApiResult<impl IntoResponse> {
    let snapshot = state.store.snapshot();
    let asset = snapshot
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Asset {} not found", id)))?;

    Ok(Json(AssetView::new(asset, &snapshot)))
}

/// Original bytes with the original MIME type
pub async fn asset_preview(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
) -> ApiResult<Response> {
    let asset = find_asset(&state, &id)?;
    let bytes = tokio::fs::read(&asset.source.path).await.map_err(|e| {
        error!("Failed to read upload for {}: {}", id, e);
        ApiError::InternalServerError
    })?;

    Ok(([(header::CONTENT_TYPE, asset.source.mime_type.clone())], bytes).into_response())
}

/// Extracted still frame, or the original bytes when there is none
pub async fn asset_poster(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
) -> ApiResult<Response> {
    let asset = find_asset(&state, &id)?;
    match &asset.poster {
        Some(jpeg) => Ok((
            [(header::CONTENT_TYPE, media::Frame::MIME_TYPE)],
            jpeg.clone(),
        )
            .into_response()),
        None => asset_preview(State(state), Path(id)).await,
    }
}

/// Activate an asset and toggle its selection
pub async fn select_asset(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
    Json(payload): Json<SelectRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.select_toggle(&id, payload.additive) {
        return Err(ApiError::NotFound(format!("Asset {} not found", id)));
    }
    Ok(Json(state.view()))
}

/// Start a caption batch; ids default to the current selection
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<impl IntoResponse> {
    let asset_ids = match payload.asset_ids {
        Some(ids) => ids,
        None => state.store.snapshot().selected_ids(),
    };
    if asset_ids.is_empty() {
        return Err(ApiError::BadRequest("No assets selected".to_string()));
    }

    // Detached: the batch reports through the session status.
    let _batch = state.orchestrator.run(asset_ids.clone(), payload.options);

    Ok((StatusCode::ACCEPTED, Json(GenerateResponse { asset_ids })))
}

/// Replace the text of one caption
pub async fn edit_caption(
    State(state): State<AppState>,
    Path((id, slot)): Path<(AssetId, CaptionSlot)>,
    Json(payload): Json<EditCaptionRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.edit_caption_text(&id, slot, &payload.text) {
        return Err(ApiError::NotFound(format!("No captions for asset {}", id)));
    }

    let snapshot = state.store.snapshot();
    let asset = snapshot
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Asset {} not found", id)))?;
    Ok(Json(AssetView::new(asset, &snapshot)))
}

fn export_text(state: &AppState, id: &AssetId) -> ApiResult<(Arc<Asset>, String)> {
    let asset = find_asset(state, id)?;
    let text = asset
        .captions
        .as_ref()
        .map(render_caption_text)
        .ok_or_else(|| ApiError::NotFound(format!("No captions for asset {}", id)))?;
    Ok((asset, text))
}

/// Combined caption text for the clipboard
pub async fn caption_text(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
) -> ApiResult<impl IntoResponse> {
    let (_, text) = export_text(&state, &id)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

/// Combined caption text as a file attachment
pub async fn download_captions(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
) -> ApiResult<impl IntoResponse> {
    let (asset, text) = export_text(&state, &id)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&asset.source.file_name),
            ),
        ],
        text,
    ))
}

/// Dismiss the current session error
pub async fn dismiss_error(State(state): State<AppState>) -> impl IntoResponse {
    state.status.dismiss_error();
    StatusCode::NO_CONTENT
}
