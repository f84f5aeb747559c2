//! Video encoding sinks.
//!
//! Sinks consume composited frames in playback order and are driven by the pipeline's encode
//! stage.

/// `ffmpeg`-based sink (video output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
