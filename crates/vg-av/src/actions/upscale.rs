//! Frame-by-frame video upscaling.
//!
//! Decodes the input to raw RGB frames through one ffmpeg child process,
//! resizes each frame in-process, and feeds the result into a second ffmpeg
//! child that encodes the scaled stream. The original audio track is muxed
//! back in afterwards, so the encode stage only ever sees video.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbImage;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use vg_core::config::UpscaleConfig;
use vg_core::{Error, Result};

use crate::actions::merge::mux_audio_from;
use crate::command::ToolCommand;
use crate::probe::probe;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Target dimensions and encoder settings for an upscale run.
#[derive(Debug, Clone)]
pub struct UpscaleOptions {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Video encoder passed to ffmpeg.
    pub encoder: String,
    /// Encoder preset.
    pub preset: String,
    /// Constant rate factor.
    pub crf: u32,
    /// Audio bitrate for the AAC remux.
    pub audio_bitrate: String,
}

impl From<&UpscaleConfig> for UpscaleOptions {
    fn from(config: &UpscaleConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            encoder: config.encoder.clone(),
            preset: config.preset.clone(),
            crf: config.crf,
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }
}

/// Progress snapshot emitted once per processed frame.
#[derive(Debug, Clone, Copy)]
pub struct UpscaleProgress {
    /// Frames processed so far.
    pub frames_done: u64,
    /// Total frames, when the probe could determine one.
    pub total_frames: Option<u64>,
}

impl UpscaleProgress {
    /// Completion percentage, when the total is known.
    pub fn percent(&self) -> Option<f64> {
        self.total_frames
            .filter(|&t| t > 0)
            .map(|t| (self.frames_done as f64 / t as f64) * 100.0)
    }
}

/// Upscale `input` to the target resolution, writing the result to `output`.
///
/// Returns the output path. The `progress` callback fires after every frame.
pub async fn upscale(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    opts: &UpscaleOptions,
    mut progress: impl FnMut(UpscaleProgress),
) -> Result<PathBuf> {
    if opts.width % 2 != 0 || opts.height % 2 != 0 {
        return Err(Error::Validation(format!(
            "target resolution {}x{} must have even dimensions",
            opts.width, opts.height
        )));
    }

    let meta = probe(tools, input).await?;
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(
        "Upscaling {} from {}x{} to {}x{} ({} frames)",
        input.display(),
        meta.width,
        meta.height,
        opts.width,
        opts.height,
        meta.frame_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".into()),
    );

    let workspace = Workspace::new()?;
    let scaled_video = workspace.temp_file("scaled_video.mp4");

    // Decoder: input file -> raw RGB frames on stdout.
    let mut decoder_cmd = ToolCommand::new(ffmpeg.path.clone());
    decoder_cmd.args(decoder_args(input));
    let mut decoder = decoder_cmd.spawn_piped()?;
    drop(decoder.stdin.take());

    // Encoder: raw RGB frames on stdin -> H.264 video-only file.
    let mut encoder_cmd = ToolCommand::new(ffmpeg.path.clone());
    encoder_cmd.args(encoder_args(opts, meta.fps, &scaled_video));
    let mut encoder = encoder_cmd.spawn_piped()?;

    let mut decoder_out = decoder
        .stdout
        .take()
        .ok_or_else(|| Error::pipeline("decode", "failed to capture decoder stdout"))?;
    let mut encoder_in = encoder
        .stdin
        .take()
        .ok_or_else(|| Error::pipeline("encode", "failed to capture encoder stdin"))?;

    // Drain both stderr pipes in the background so neither child can block
    // on a full pipe buffer; the collected text feeds error messages.
    let decoder_err = drain_stderr(decoder.stderr.take());
    let encoder_err = drain_stderr(encoder.stderr.take());

    let frame_size = meta.width as usize * meta.height as usize * 3;
    let mut frame_buf = vec![0u8; frame_size];
    let mut frames_done: u64 = 0;

    loop {
        if !read_frame(&mut decoder_out, &mut frame_buf).await? {
            break;
        }

        let frame = RgbImage::from_raw(meta.width, meta.height, frame_buf.clone())
            .ok_or_else(|| Error::pipeline("resize", "frame buffer size mismatch"))?;
        let resized = image::imageops::resize(&frame, opts.width, opts.height, FilterType::CatmullRom);

        encoder_in
            .write_all(resized.as_raw())
            .await
            .map_err(|e| Error::pipeline("encode", format!("failed to write frame: {e}")))?;

        frames_done += 1;
        progress(UpscaleProgress {
            frames_done,
            total_frames: meta.frame_count,
        });
    }

    // Close the encoder's stdin so it can flush and finish.
    drop(encoder_in);

    let decoder_status = decoder
        .wait()
        .await
        .map_err(|e| Error::pipeline("decode", format!("wait failed: {e}")))?;
    let encoder_status = encoder
        .wait()
        .await
        .map_err(|e| Error::pipeline("encode", format!("wait failed: {e}")))?;

    if !decoder_status.success() {
        let stderr = decoder_err.await.unwrap_or_default();
        return Err(Error::pipeline(
            "decode",
            format!("decoder exited with {decoder_status}: {}", stderr.trim()),
        ));
    }
    if !encoder_status.success() {
        let stderr = encoder_err.await.unwrap_or_default();
        return Err(Error::pipeline(
            "encode",
            format!("encoder exited with {encoder_status}: {}", stderr.trim()),
        ));
    }
    if frames_done == 0 {
        return Err(Error::pipeline("decode", "no frames decoded from input"));
    }

    tracing::info!("Encoded {frames_done} scaled frames");

    if meta.has_audio {
        mux_audio_from(tools, &scaled_video, input, output, &opts.audio_bitrate).await?;
    } else {
        workspace.promote(&scaled_video, output)?;
    }

    Ok(output.to_path_buf())
}

fn decoder_args(input: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-".into(),
    ]
}

fn encoder_args(opts: &UpscaleOptions, fps: f64, output: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{}x{}", opts.width, opts.height),
        "-r".into(),
        format!("{fps:.3}"),
        "-i".into(),
        "-".into(),
        "-an".into(),
        "-c:v".into(),
        opts.encoder.clone(),
        "-preset".into(),
        opts.preset.clone(),
        "-crf".into(),
        opts.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Read one full frame into `buf`.
///
/// Returns `Ok(false)` on clean end-of-stream (no bytes read); a partial
/// frame is a pipeline error since rawvideo output is always whole frames.
async fn read_frame(reader: &mut (impl AsyncRead + Unpin), buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader
            .read(&mut buf[filled..])
            .await
            .map_err(|e| Error::pipeline("decode", format!("read failed: {e}")))?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::pipeline(
                "decode",
                format!("truncated frame: got {filled} of {} bytes", buf.len()),
            ));
        }
        filled += n;
    }
    Ok(true)
}

/// Collect a child's stderr into a string on a background task.
fn drain_stderr(
    stderr: Option<tokio::process::ChildStderr>,
) -> tokio::task::JoinHandle<String> {
    tokio::spawn(async move {
        let mut text = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut text).await;
        }
        text
    })
}
