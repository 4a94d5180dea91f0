//! Unified error type for the vidgrab application.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`]. Extraction failures additionally carry a
//! [`FetchErrorKind`] so the retry layer can decide whether another attempt
//! is worthwhile.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of an extraction failure.
///
/// The kinds mirror the distinct failure messages the extractor produces;
/// each maps to its own HTTP status and retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The URL is not something the extractor understands.
    UnsupportedUrl,
    /// The video has been removed or never existed.
    Unavailable,
    /// The video is private.
    Private,
    /// The video requires age verification.
    AgeRestricted,
    /// The upstream service is rate-limiting us.
    RateLimited,
    /// No stream at the requested resolution exists.
    ResolutionUnavailable,
    /// The upstream service demanded a bot-detection challenge.
    BotChallenge,
    /// A transport-level failure (timeout, DNS, reset connection).
    Network,
    /// Any other extractor failure.
    Extractor,
}

impl FetchErrorKind {
    /// Whether another attempt (with a different player client and a
    /// backoff delay) has a chance of succeeding.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            FetchErrorKind::RateLimited
                | FetchErrorKind::BotChallenge
                | FetchErrorKind::Network
                | FetchErrorKind::Extractor
        )
    }

    /// HTTP status the server responds with for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            FetchErrorKind::UnsupportedUrl => 400,
            FetchErrorKind::Unavailable => 404,
            FetchErrorKind::Private => 403,
            FetchErrorKind::AgeRestricted => 403,
            FetchErrorKind::RateLimited => 429,
            FetchErrorKind::ResolutionUnavailable => 404,
            FetchErrorKind::BotChallenge => 429,
            FetchErrorKind::Network => 502,
            FetchErrorKind::Extractor => 502,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn as_code(&self) -> &'static str {
        match self {
            FetchErrorKind::UnsupportedUrl => "unsupported_url",
            FetchErrorKind::Unavailable => "unavailable",
            FetchErrorKind::Private => "private",
            FetchErrorKind::AgeRestricted => "age_restricted",
            FetchErrorKind::RateLimited => "rate_limited",
            FetchErrorKind::ResolutionUnavailable => "resolution_unavailable",
            FetchErrorKind::BotChallenge => "bot_challenge",
            FetchErrorKind::Network => "network",
            FetchErrorKind::Extractor => "extractor",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Unified error type covering all failure modes in vidgrab.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "file", "download").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe, yt-dlp) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The extractor failed; `kind` drives retry and status mapping.
    #[error("Fetch error [{kind}]: {message}")]
    Fetch {
        /// Classified failure kind.
        kind: FetchErrorKind,
        /// Human-readable error description.
        message: String,
    },

    /// A processing pipeline step failed.
    #[error("Pipeline error [{step}]: {message}")]
    Pipeline {
        /// The pipeline step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// An outbound HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Probe(_) => 422,
            Error::Fetch { kind, .. } => kind.http_status(),
            Error::Pipeline { .. } => 500,
            Error::Http(_) => 502,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Fetch`].
    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Error::Fetch {
            kind,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Pipeline`].
    pub fn pipeline(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Pipeline {
            step: step.into(),
            message: message.into(),
        }
    }

    /// The [`FetchErrorKind`] if this is a fetch error.
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Error::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::Validation("No URL provided".into());
        assert_eq!(err.to_string(), "Validation error: No URL provided");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("file", "video_1080p.mp4");
        assert_eq!(err.to_string(), "file not found: video_1080p.mp4");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn fetch_status_follows_kind() {
        let err = Error::fetch(FetchErrorKind::RateLimited, "HTTP Error 429");
        assert_eq!(err.http_status(), 429);
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::RateLimited));

        let err = Error::fetch(FetchErrorKind::ResolutionUnavailable, "no 1080p");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn retryable_kinds() {
        assert!(FetchErrorKind::RateLimited.retryable());
        assert!(FetchErrorKind::BotChallenge.retryable());
        assert!(FetchErrorKind::Network.retryable());
        assert!(FetchErrorKind::Extractor.retryable());
        assert!(!FetchErrorKind::UnsupportedUrl.retryable());
        assert!(!FetchErrorKind::Unavailable.retryable());
        assert!(!FetchErrorKind::Private.retryable());
        assert!(!FetchErrorKind::AgeRestricted.retryable());
        assert!(!FetchErrorKind::ResolutionUnavailable.retryable());
    }

    #[test]
    fn pipeline_display() {
        let err = Error::pipeline("decode", "decoder exited early");
        assert_eq!(
            err.to_string(),
            "Pipeline error [decode]: decoder exited early"
        );
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(FetchErrorKind::UnsupportedUrl.as_code(), "unsupported_url");
        assert_eq!(FetchErrorKind::Extractor.as_code(), "extractor");
        assert_eq!(FetchErrorKind::Extractor.to_string(), "extractor");
    }
}
