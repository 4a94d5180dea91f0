//! Typed views over the extractor's metadata output.
//!
//! Minimal version of yt-dlp's `--dump-single-json` payload: only the
//! fields the stream selector reads are modeled, everything else is ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vg_core::Error;

/// Top-level video metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    /// Upstream video identifier.
    pub id: String,
    /// Video title, when present.
    #[serde(default)]
    pub title: Option<String>,
    /// All available formats, progressive and split.
    #[serde(default)]
    pub formats: Vec<Format>,
}

/// One downloadable format from the metadata dump.
#[derive(Debug, Clone, Deserialize)]
pub struct Format {
    /// Identifier passed back via `-f`.
    pub format_id: String,
    /// Container extension ("mp4", "m4a", "webm", ...).
    #[serde(default)]
    pub ext: Option<String>,
    /// Video codec; the literal string "none" marks audio-only formats.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Audio codec; the literal string "none" marks video-only formats.
    #[serde(default)]
    pub acodec: Option<String>,
    /// Frame height in pixels, for video formats.
    #[serde(default)]
    pub height: Option<u32>,
    /// Average audio bitrate in kbit/s, for audio formats.
    #[serde(default)]
    pub abr: Option<f64>,
}

impl Format {
    /// Whether this format carries a video track.
    pub fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(c) if c != "none")
    }

    /// Whether this format carries an audio track.
    pub fn has_audio(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(c) if c != "none")
    }

    /// A single file with both video and audio.
    pub fn is_progressive(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// MP4-family container (mp4 video, m4a audio).
    pub fn is_mp4_family(&self) -> bool {
        matches!(self.ext.as_deref(), Some("mp4") | Some("m4a"))
    }
}

/// A requested output resolution, parsed from strings like `"1080p"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution(u32);

impl Resolution {
    /// Lowest height accepted.
    pub const MIN_HEIGHT: u32 = 144;
    /// Highest height accepted.
    pub const MAX_HEIGHT: u32 = 4320;

    /// Build from a pixel height, validating the supported range.
    pub fn from_height(height: u32) -> Result<Self, Error> {
        if !(Self::MIN_HEIGHT..=Self::MAX_HEIGHT).contains(&height) {
            return Err(Error::Validation(format!(
                "resolution {height}p out of supported range ({}p-{}p)",
                Self::MIN_HEIGHT,
                Self::MAX_HEIGHT
            )));
        }
        Ok(Self(height))
    }

    /// The pixel height.
    pub fn height(&self) -> u32 {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self(1080)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.0)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_suffix('p')
            .ok_or_else(|| Error::Validation(format!("invalid resolution: {s:?}")))?;
        let height: u32 = digits
            .parse()
            .map_err(|_| Error::Validation(format!("invalid resolution: {s:?}")))?;
        Self::from_height(height)
    }
}

impl TryFrom<String> for Resolution {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_track_flags() {
        let progressive = Format {
            format_id: "22".into(),
            ext: Some("mp4".into()),
            vcodec: Some("avc1.64001F".into()),
            acodec: Some("mp4a.40.2".into()),
            height: Some(720),
            abr: None,
        };
        assert!(progressive.is_progressive());
        assert!(progressive.is_mp4_family());

        let video_only = Format {
            acodec: Some("none".into()),
            ..progressive.clone()
        };
        assert!(video_only.has_video());
        assert!(!video_only.has_audio());
        assert!(!video_only.is_progressive());
    }

    #[test]
    fn resolution_parse_and_display() {
        let res: Resolution = "1080p".parse().unwrap();
        assert_eq!(res.height(), 1080);
        assert_eq!(res.to_string(), "1080p");
    }

    #[test]
    fn resolution_rejects_garbage() {
        assert!("1080".parse::<Resolution>().is_err());
        assert!("p".parse::<Resolution>().is_err());
        assert!("abcp".parse::<Resolution>().is_err());
        assert!("100000p".parse::<Resolution>().is_err());
        assert!("10p".parse::<Resolution>().is_err());
    }

    #[test]
    fn resolution_serde_round_trip() {
        let res: Resolution = serde_json::from_str("\"720p\"").unwrap();
        assert_eq!(res.height(), 720);
        assert_eq!(serde_json::to_string(&res).unwrap(), "\"720p\"");
        assert!(serde_json::from_str::<Resolution>("\"junk\"").is_err());
    }

    #[test]
    fn video_info_parses_partial_formats() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Test",
            "formats": [
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "height": 1080}
            ]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.formats.len(), 2);
        assert!(info.formats[0].has_audio());
        assert_eq!(info.formats[1].height, Some(1080));
    }
}
