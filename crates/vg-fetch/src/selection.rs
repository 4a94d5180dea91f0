//! Resolution-based stream selection.
//!
//! Mirrors the download service's contract: prefer a progressive MP4 at
//! exactly the requested height; otherwise fall back to the video-only MP4
//! at that height paired with the best available MP4-family audio.

use vg_core::{Error, FetchErrorKind, Result};

use crate::types::{Format, Resolution, VideoInfo};

/// Outcome of matching the requested resolution against available formats.
#[derive(Debug, Clone)]
pub enum StreamSelection {
    /// One file carrying both video and audio.
    Progressive(Format),
    /// Separate halves that need an ffmpeg merge.
    Split {
        /// Video-only format at the requested height.
        video: Format,
        /// Best audio-only format.
        audio: Format,
    },
}

/// Pick the formats to download for `resolution`.
///
/// # Errors
///
/// [`FetchErrorKind::ResolutionUnavailable`] when neither a progressive
/// stream nor a complete video/audio pair exists at the requested height.
pub fn select_streams(info: &VideoInfo, resolution: Resolution) -> Result<StreamSelection> {
    let height = resolution.height();

    // Progressive stream (video + audio together).
    if let Some(progressive) = info
        .formats
        .iter()
        .find(|f| f.is_progressive() && f.is_mp4_family() && f.height == Some(height))
    {
        return Ok(StreamSelection::Progressive(progressive.clone()));
    }

    // Separate video and audio streams.
    let video = info
        .formats
        .iter()
        .find(|f| f.has_video() && !f.has_audio() && f.is_mp4_family() && f.height == Some(height));

    let audio = info
        .formats
        .iter()
        .filter(|f| f.has_audio() && !f.has_video() && f.is_mp4_family())
        .max_by(|a, b| {
            a.abr
                .unwrap_or(0.0)
                .partial_cmp(&b.abr.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    match (video, audio) {
        (Some(v), Some(a)) => Ok(StreamSelection::Split {
            video: v.clone(),
            audio: a.clone(),
        }),
        _ => Err(Error::fetch(
            FetchErrorKind::ResolutionUnavailable,
            format!("Requested resolution not available: {resolution}"),
        )),
    }
}
