use image::RgbImage;

use crate::foundation::error::{TexlapseError, TexlapseResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: u32,
}

impl SinkConfig {
    pub fn validate(&self) -> TexlapseResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TexlapseError::validation(
                "sink width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(TexlapseError::validation("sink fps must be non-zero"));
        }
        Ok(())
    }
}

/// Sink contract for consuming frames in playback order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `idx`.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> TexlapseResult<()>;
    /// Push one frame; `idx` is its position in the output video.
    fn push_frame(&mut self, idx: u64, frame: &RgbImage) -> TexlapseResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> TexlapseResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, RgbImage)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Frames in playback order.
    pub fn frames(&self) -> &[(u64, RgbImage)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TexlapseResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &RgbImage) -> TexlapseResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| TexlapseError::encode("in-memory sink not started"))?;
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(TexlapseError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TexlapseResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(
            SinkConfig {
                width: 0,
                height: 10,
                fps: 10,
            }
            .validate()
            .is_err()
        );
        assert!(
            SinkConfig {
                width: 10,
                height: 10,
                fps: 0,
            }
            .validate()
            .is_err()
        );
        assert!(
            SinkConfig {
                width: 11,
                height: 7,
                fps: 10,
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn in_memory_sink_rejects_wrong_size() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 4,
            height: 4,
            fps: 10,
        })
        .unwrap();
        assert!(sink.push_frame(0, &RgbImage::new(4, 4)).is_ok());
        assert!(sink.push_frame(1, &RgbImage::new(4, 5)).is_err());
        sink.end().unwrap();
        assert_eq!(sink.frames().len(), 1);
        assert!(sink.is_finished());
    }
}
