//! Stream merging via ffmpeg.
//!
//! Two fixed invocations: combining separately-downloaded video and audio
//! halves into one MP4, and muxing the original audio track into a freshly
//! encoded video-only file.

use std::path::Path;

use vg_core::Result;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Combine a video-only file and an audio-only file into `output`.
///
/// Video is stream-copied; audio is encoded to AAC so the result plays in
/// an MP4 container regardless of the source audio codec.
pub async fn merge_streams(
    tools: &ToolRegistry,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(
        "Merging {} + {} -> {}",
        video.display(),
        audio.display(),
        output.display()
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(merge_args(video, audio, output));
    cmd.execute().await?;

    Ok(())
}

fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        video.to_string_lossy().into_owned(),
        "-i".into(),
        audio.to_string_lossy().into_owned(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Mux the audio track of `audio_source` into the (audio-less) `video` file.
///
/// Used by the upscaler: the encoded video is copied as-is, the audio is
/// taken from the original input and encoded to AAC. Stream mapping is
/// explicit so extra tracks in the source never leak into the result.
pub async fn mux_audio_from(
    tools: &ToolRegistry,
    video: &Path,
    audio_source: &Path,
    output: &Path,
    audio_bitrate: &str,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(
        "Muxing audio from {} into {}",
        audio_source.display(),
        output.display()
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(mux_audio_args(video, audio_source, output, audio_bitrate));
    cmd.execute().await?;

    Ok(())
}

fn mux_audio_args(
    video: &Path,
    audio_source: &Path,
    output: &Path,
    audio_bitrate: &str,
) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        video.to_string_lossy().into_owned(),
        "-i".into(),
        audio_source.to_string_lossy().into_owned(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        audio_bitrate.into(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        output.to_string_lossy().into_owned(),
    ]
}
