//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for server, tools, fetch, upscale, and lookup. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tools: ToolsConfig,
    pub fetch: FetchConfig,
    pub upscale: UpscaleConfig,
    pub lookup: LookupConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.fetch.max_attempts == 0 {
            warnings.push("fetch.max_attempts is 0; every download will fail immediately".into());
        }

        if self.fetch.player_clients.is_empty() {
            warnings.push("fetch.player_clients is empty; the extractor default will be used".into());
        }

        if self.fetch.base_delay_ms > self.fetch.max_delay_ms {
            warnings.push(format!(
                "fetch.base_delay_ms ({}) exceeds fetch.max_delay_ms ({})",
                self.fetch.base_delay_ms, self.fetch.max_delay_ms
            ));
        }

        if self.upscale.width % 2 != 0 || self.upscale.height % 2 != 0 {
            warnings.push(format!(
                "upscale target {}x{} has odd dimensions; H.264 requires even sizes",
                self.upscale.width, self.upscale.height
            ));
        }

        if self.lookup.result_count == 0 {
            warnings.push("lookup.result_count is 0; searches will return nothing".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory completed artifacts are moved into and served from.
    pub download_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

/// Explicit override paths for external tools. `None` means "search PATH".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
}

/// Extraction retry and client-permutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts before a retryable failure is given up on.
    pub max_attempts: u32,
    /// First backoff delay; doubles per attempt.
    pub base_delay_ms: u64,
    /// Ceiling for the backoff delay.
    pub max_delay_ms: u64,
    /// Extractor player clients to rotate through, one per attempt.
    pub player_clients: Vec<String>,
    /// Maximum run time for a single extractor invocation.
    pub tool_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            player_clients: vec!["android".into(), "ios".into(), "web".into()],
            tool_timeout_secs: 600,
        }
    }
}

/// Upscale pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpscaleConfig {
    /// Default target width.
    pub width: u32,
    /// Default target height.
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

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            width: 3840,
            height: 2160,
            encoder: "libx264".into(),
            preset: "medium".into(),
            crf: 18,
            audio_bitrate: "192k".into(),
        }
    }
}

/// Email lookup endpoints and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Base URL of the avatar/profile service.
    pub gravatar_base: String,
    /// Base URL of the HTML search endpoint.
    pub search_base: String,
    /// Maximum number of search result links to return.
    pub result_count: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            gravatar_base: "https://www.gravatar.com".into(),
            search_base: "https://html.duckduckgo.com/html/".into(),
            result_count: 5,
            timeout_secs: 5,
        }
    }
}
