//! A/V actions: stream merging and frame-by-frame upscaling.

mod merge;
mod upscale;

pub use merge::{merge_streams, mux_audio_from};
pub use upscale::{upscale, UpscaleOptions, UpscaleProgress};
