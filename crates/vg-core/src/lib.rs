//! # vg-core
//!
//! Shared foundation for the vidgrab workspace: the unified [`Error`] type
//! with HTTP status mapping, typed IDs, and application [`config`].

pub mod config;
pub mod error;
pub mod ids;

pub use error::{Error, FetchErrorKind, Result};
pub use ids::DownloadId;
