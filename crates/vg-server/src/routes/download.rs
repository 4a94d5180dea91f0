//! Download submission route handler.
//!
//! The core operation of the service: accept a video URL and a resolution,
//! run the extraction pipeline (with its retry/backoff), merge split
//! streams when no progressive file exists, and publish the artifact under
//! a unique name.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vg_core::{DownloadId, Error};
use vg_fetch::{Fetched, Resolution};

use crate::context::AppContext;
use crate::error::AppError;

/// Request body for submitting a download.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Video page URL.
    pub url: Option<String>,
    /// Requested resolution, e.g. "1080p". Defaults to 1080p.
    pub resolution: Option<String>,
}

/// Response for a completed download.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DownloadResponse {
    pub message: String,
    /// Relative URL the artifact can be fetched from.
    pub download_url: String,
    pub file_name: String,
    pub resolution: String,
    /// Whether separate video/audio halves had to be merged.
    pub merged: bool,
}

/// POST /api/download (also mounted at POST / for legacy-client compatibility)
#[utoipa::path(
    post,
    path = "/api/download",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Download completed", body = DownloadResponse),
        (status = 400, description = "Missing or unsupported URL"),
        (status = 404, description = "Resolution not available"),
        (status = 429, description = "Upstream is rate-limiting"),
        (status = 502, description = "Extractor or merge failure")
    )
)]
pub async fn submit_download(
    State(ctx): State<AppContext>,
    Json(payload): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, AppError> {
    let url = payload.url.as_deref().map(str::trim).unwrap_or("");
    if url.is_empty() {
        return Err(Error::Validation("No URL provided".into()).into());
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::Validation(format!("not an http(s) URL: {url}")).into());
    }

    let resolution: Resolution = payload
        .resolution
        .as_deref()
        .unwrap_or("1080p")
        .parse()
        .map_err(AppError::from)?;

    tracing::info!(%resolution, "Download requested");

    let workspace = vg_av::Workspace::new().map_err(AppError::from)?;
    let outcome = ctx.fetch.fetch(url, resolution, workspace.path()).await?;

    let (artifact, merged, message) = match &outcome.streams {
        Fetched::Progressive { path } => (
            path.clone(),
            false,
            "Downloaded video with audio successfully.",
        ),
        Fetched::Split { video, audio } => {
            let merged_path = workspace.temp_file(&format!("output_{resolution}.mp4"));
            vg_av::merge_streams(&ctx.tools, video, audio, &merged_path).await?;
            (
                merged_path,
                true,
                "Downloaded and merged video successfully.",
            )
        }
    };

    let file_name = outcome.artifact_name(Some(&DownloadId::new().short()));
    let dest = ctx.download_dir().join(&file_name);
    workspace.promote(&artifact, &dest)?;
    ctx.register_file(&file_name, dest);

    tracing::info!(
        video_id = %outcome.video_id,
        file_name = %file_name,
        merged,
        "Download completed"
    );

    Ok(Json(DownloadResponse {
        message: message.to_string(),
        download_url: format!("/download/{file_name}"),
        file_name,
        resolution: resolution.to_string(),
        merged,
    }))
}
