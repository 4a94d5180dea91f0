//! # vg-fetch
//!
//! The extraction layer: a typed wrapper around the `yt-dlp` CLI with
//! resolution-based stream selection, an error taxonomy classifying the
//! extractor's failure messages, and retry/backoff with player-client
//! permutation for transient failures.

pub mod classify;
pub mod client;
pub mod retry;
pub mod selection;
pub mod types;

pub use classify::classify_stderr;
pub use client::{FetchClient, FetchOutcome, Fetched};
pub use retry::RetryPolicy;
pub use selection::{select_streams, StreamSelection};
pub use types::{Format, Resolution, VideoInfo};
