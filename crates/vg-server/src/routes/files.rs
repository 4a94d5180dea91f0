//! Artifact serving route handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use vg_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /download/{file_name}
///
/// Streams a registered artifact as an attachment. Only names present in
/// the served-file registry resolve, so traversal paths fall through to a
/// plain 404.
#[utoipa::path(
    get,
    path = "/download/{file_name}",
    params(("file_name" = String, Path, description = "Public artifact name")),
    responses(
        (status = 200, description = "Artifact contents", content_type = "video/mp4"),
        (status = 404, description = "Unknown artifact")
    )
)]
pub async fn serve_download(
    State(ctx): State<AppContext>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let served = ctx
        .resolve_file(&file_name)
        .ok_or_else(|| Error::not_found("file", &file_name))?;

    let file = tokio::fs::File::open(&served.path)
        .await
        .map_err(|e| Error::Internal(format!("failed to open artifact: {e}")))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| Error::Internal(format!("failed to stat artifact: {e}")))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];

    Ok((headers, body).into_response())
}
