//! The extraction client.
//!
//! All yt-dlp invocations flow through [`FetchClient`]: metadata dumps,
//! format downloads, and the retrying [`FetchClient::fetch`] entry point
//! the server and CLI share. Tool failures are reclassified into
//! [`vg_core::Error::Fetch`] so callers see the taxonomy, not raw stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vg_av::{ToolCommand, ToolRegistry};
use vg_core::config::FetchConfig;
use vg_core::{Error, FetchErrorKind, Result};

use crate::classify::classify_stderr;
use crate::retry::RetryPolicy;
use crate::selection::{select_streams, StreamSelection};
use crate::types::{Resolution, VideoInfo};

/// Downloaded stream files, prior to any merge.
#[derive(Debug, Clone)]
pub enum Fetched {
    /// A single progressive file with audio and video.
    Progressive {
        /// Path of the downloaded file inside the work directory.
        path: PathBuf,
    },
    /// Separate halves that still need an ffmpeg merge.
    Split {
        /// Video-only file.
        video: PathBuf,
        /// Audio-only file.
        audio: PathBuf,
    },
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Upstream video identifier.
    pub video_id: String,
    /// Video title, when the extractor reported one.
    pub title: Option<String>,
    /// The resolution that was requested and matched.
    pub resolution: Resolution,
    /// The downloaded file(s).
    pub streams: Fetched,
}

impl FetchOutcome {
    /// Filesystem-safe public name for the final artifact.
    ///
    /// The upstream id is reduced to a conservative alphabet; an optional
    /// suffix (the server passes a fresh short id) keeps concurrent
    /// requests for the same video from clobbering each other.
    pub fn artifact_name(&self, suffix: Option<&str>) -> String {
        let safe_id: String = self
            .video_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(32)
            .collect();
        let safe_id = if safe_id.is_empty() {
            "video".to_string()
        } else {
            safe_id
        };
        match suffix {
            Some(s) => format!("{safe_id}_{}_{s}.mp4", self.resolution),
            None => format!("{safe_id}_{}.mp4", self.resolution),
        }
    }
}

/// Wrapper owning the extractor tool path and fetch configuration.
pub struct FetchClient {
    tools: Arc<ToolRegistry>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl FetchClient {
    /// Build a client over the discovered tools and fetch config.
    pub fn new(tools: Arc<ToolRegistry>, config: &FetchConfig) -> Self {
        Self {
            tools,
            policy: RetryPolicy::from_config(config),
            timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }

    /// Download `url` at `resolution` into `workdir`, retrying transient
    /// failures with backoff and a different player client per attempt.
    ///
    /// Non-retryable failures (bad URL, private video, missing resolution)
    /// abort immediately; when all attempts fail the last error is returned.
    pub async fn fetch(
        &self,
        url: &str,
        resolution: Resolution,
        workdir: &Path,
    ) -> Result<FetchOutcome> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..self.policy.max_attempts() {
            if attempt > 0 {
                let delay = self.policy.delay(attempt - 1);
                tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            let client = self.policy.player_client(attempt);
            tracing::debug!(attempt, player_client = ?client, %resolution, "Extraction attempt");

            match self.attempt(url, resolution, workdir, client).await {
                Ok(outcome) => {
                    if attempt > 0 {
                        tracing::info!(attempt, "Extraction succeeded after retry");
                    }
                    return Ok(outcome);
                }
                Err(e) => {
                    let retryable = e.fetch_kind().map(|k| k.retryable()).unwrap_or(false);
                    if !retryable {
                        return Err(e);
                    }
                    tracing::warn!(attempt, error = %e, "Extraction attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::fetch(FetchErrorKind::Extractor, "no extraction attempts were made")
        }))
    }

    /// One full attempt: metadata, selection, download(s).
    async fn attempt(
        &self,
        url: &str,
        resolution: Resolution,
        workdir: &Path,
        player_client: Option<&str>,
    ) -> Result<FetchOutcome> {
        let info = self.video_info(url, player_client).await?;
        let selection = select_streams(&info, resolution)?;

        let streams = match selection {
            StreamSelection::Progressive(stream) => {
                let dest = workdir.join(format!("video_{resolution}.mp4"));
                self.download_format(url, &stream.format_id, &dest, player_client)
                    .await?;
                Fetched::Progressive { path: dest }
            }
            StreamSelection::Split { video, audio } => {
                let video_dest = workdir.join("video_temp.mp4");
                let audio_dest = workdir.join("audio_temp.m4a");
                self.download_format(url, &video.format_id, &video_dest, player_client)
                    .await?;
                self.download_format(url, &audio.format_id, &audio_dest, player_client)
                    .await?;
                Fetched::Split {
                    video: video_dest,
                    audio: audio_dest,
                }
            }
        };

        Ok(FetchOutcome {
            video_id: info.id,
            title: info.title,
            resolution,
            streams,
        })
    }

    /// Dump and parse the metadata JSON for `url`.
    pub async fn video_info(&self, url: &str, player_client: Option<&str>) -> Result<VideoInfo> {
        let ytdlp = self.tools.require("yt-dlp")?;

        let mut cmd = ToolCommand::new(ytdlp.path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["--dump-single-json", "--no-playlist", "--no-warnings"]);
        push_client_args(&mut cmd, player_client);
        cmd.arg(url);

        let output = cmd.execute().await.map_err(reclassify)?;

        serde_json::from_str(&output.stdout).map_err(|e| {
            Error::fetch(
                FetchErrorKind::Extractor,
                format!("unparseable metadata: {e}"),
            )
        })
    }

    /// Download a single format to `dest`.
    pub async fn download_format(
        &self,
        url: &str,
        format_id: &str,
        dest: &Path,
        player_client: Option<&str>,
    ) -> Result<()> {
        let ytdlp = self.tools.require("yt-dlp")?;

        let mut cmd = ToolCommand::new(ytdlp.path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["-f", format_id]);
        cmd.args(["--no-playlist", "--no-warnings", "--no-part", "--no-progress"]);
        push_client_args(&mut cmd, player_client);
        cmd.arg("-o");
        cmd.arg(dest.to_string_lossy().as_ref());
        cmd.arg(url);

        cmd.execute().await.map_err(reclassify)?;

        if !dest.exists() {
            return Err(Error::fetch(
                FetchErrorKind::Extractor,
                format!("extractor reported success but {} is missing", dest.display()),
            ));
        }

        Ok(())
    }
}

fn push_client_args(cmd: &mut ToolCommand, player_client: Option<&str>) {
    if let Some(client) = player_client {
        cmd.arg("--extractor-args");
        cmd.arg(format!("youtube:player_client={client}"));
    }
}

/// Turn a yt-dlp tool failure into a classified fetch error.
fn reclassify(err: Error) -> Error {
    match err {
        Error::Tool { ref tool, ref message } if tool == "yt-dlp" => {
            Error::fetch(classify_stderr(message), message.clone())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_core::config::ToolsConfig;

    fn outcome_with_id(id: &str) -> FetchOutcome {
        FetchOutcome {
            video_id: id.into(),
            title: None,
            resolution: "720p".parse().unwrap(),
            streams: Fetched::Progressive {
                path: PathBuf::from("/tmp/x.mp4"),
            },
        }
    }

    #[test]
    fn artifact_name_sanitizes_id() {
        let name = outcome_with_id("abc/../../etc").artifact_name(None);
        assert_eq!(name, "abcetc_720p.mp4");
    }

    #[test]
    fn artifact_name_handles_hostile_ids() {
        let name = outcome_with_id("///").artifact_name(Some("deadbeef"));
        assert_eq!(name, "video_720p_deadbeef.mp4");
    }

    #[cfg(unix)]
    fn stub_registry(dir: &Path, script_body: &str) -> Arc<ToolRegistry> {
        use std::os::unix::fs::PermissionsExt;

        let stub = dir.join("yt-dlp");
        std::fs::write(&stub, format!("#!/bin/sh\n{script_body}\n")).unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tools_config = ToolsConfig {
            ytdlp_path: Some(stub),
            ..ToolsConfig::default()
        };
        Arc::new(ToolRegistry::discover(&tools_config))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn video_info_parses_stub_output() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{\"id\": \"abc123\", \"title\": \"Stub\", \"formats\": []}"#;
        let tools = stub_registry(dir.path(), &format!("echo \"{json}\""));

        let client = FetchClient::new(tools, &FetchConfig::default());
        let info = client.video_info("https://example.test/v", None).await.unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.title.as_deref(), Some("Stub"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_failure_is_reclassified() {
        let dir = tempfile::tempdir().unwrap();
        let tools = stub_registry(
            dir.path(),
            "echo 'ERROR: Private video. Sign in if you have access' >&2; exit 1",
        );

        let client = FetchClient::new(tools, &FetchConfig::default());
        let err = client
            .video_info("https://example.test/v", None)
            .await
            .unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Private));
        assert_eq!(err.http_status(), 403);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_retryable_fetch_stops_after_one_attempt() {
        let dir = tempfile::tempdir().unwrap();
        // Count invocations so we can assert the retry loop aborted early.
        let counter = dir.path().join("calls");
        let body = format!(
            "echo x >> {}\necho 'ERROR: Video unavailable' >&2\nexit 1",
            counter.display()
        );
        let tools = stub_registry(dir.path(), &body);

        let config = FetchConfig {
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..FetchConfig::default()
        };
        let client = FetchClient::new(tools, &config);
        let err = client
            .fetch(
                "https://example.test/v",
                Resolution::default(),
                dir.path(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Unavailable));
        let calls = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(calls.lines().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn retryable_fetch_exhausts_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("calls");
        let body = format!(
            "echo x >> {}\necho 'ERROR: HTTP Error 429: Too Many Requests' >&2\nexit 1",
            counter.display()
        );
        let tools = stub_registry(dir.path(), &body);

        let config = FetchConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..FetchConfig::default()
        };
        let client = FetchClient::new(tools, &config);
        let err = client
            .fetch(
                "https://example.test/v",
                Resolution::default(),
                dir.path(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::RateLimited));
        let calls = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(calls.lines().count(), 3);
    }
}
