//! Video metadata probing via `ffprobe` JSON output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use vg_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Metadata the pipelines need about a video file.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMeta {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Total frame count, when the container reports or implies one.
    pub frame_count: Option<u64>,
    /// Duration in seconds.
    pub duration_secs: Option<f64>,
    /// Whether the file has at least one audio stream.
    pub has_audio: bool,
}

// Serde views over the subset of ffprobe's JSON we read.

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a video file.
///
/// Runs `ffprobe -v quiet -print_format json -show_format -show_streams`
/// and distills the pieces the pipelines care about. When the container
/// does not carry an explicit frame count, one is derived from duration
/// and frame rate.
pub async fn probe(tools: &ToolRegistry, path: &Path) -> Result<VideoMeta> {
    if !path.exists() {
        return Err(Error::not_found("file", path.display()));
    }

    let ffprobe = tools.require("ffprobe")?;

    let output = ToolCommand::new(ffprobe.path.clone())
        .args(["-v", "quiet", "-print_format", "json"])
        .args(["-show_format", "-show_streams"])
        .arg(path.to_string_lossy().as_ref())
        .execute()
        .await?;

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(json: &str) -> Result<VideoMeta> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::Probe(format!("invalid ffprobe JSON: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| Error::Probe("no video stream found".into()))?;

    let width = video
        .width
        .ok_or_else(|| Error::Probe("video stream has no width".into()))?;
    let height = video
        .height
        .ok_or_else(|| Error::Probe("video stream has no height".into()))?;

    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .ok_or_else(|| Error::Probe("video stream has no usable frame rate".into()))?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    // Prefer the container's frame count; fall back to duration * fps.
    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| duration_secs.map(|d| (d * fps).round() as u64).filter(|&n| n > 0));

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoMeta {
        width,
        height,
        fps,
        frame_count,
        duration_secs,
        has_audio,
    })
}

/// Parse ffprobe's fractional frame rate ("30000/1001", "25/1", "24").
fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "codec_type": "video",
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "nb_frames": "3600"
            },
            {
                "codec_type": "audio",
                "codec_name": "aac",
                "r_frame_rate": "0/0"
            }
        ],
        "format": {
            "duration": "120.12"
        }
    }"#;

    #[test]
    fn parses_full_output() {
        let meta = parse_probe_output(SAMPLE).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert!((meta.fps - 29.97).abs() < 0.01);
        assert_eq!(meta.frame_count, Some(3600));
        assert!(meta.has_audio);
        assert_eq!(meta.duration_secs, Some(120.12));
    }

    #[test]
    fn frame_count_falls_back_to_duration() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 640, "height": 360, "r_frame_rate": "25/1"}
            ],
            "format": {"duration": "10.0"}
        }"#;
        let meta = parse_probe_output(json).unwrap();
        assert_eq!(meta.frame_count, Some(250));
        assert!(!meta.has_audio);
    }

    #[test]
    fn missing_video_stream_is_probe_error() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        let err = parse_probe_output(json).unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn frame_rate_fractions() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("garbage").is_none());
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn garbage_json_is_probe_error() {
        assert!(matches!(
            parse_probe_output("not json"),
            Err(Error::Probe(_))
        ));
    }
}
