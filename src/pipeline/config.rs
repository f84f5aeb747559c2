use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::FfmpegSinkOpts;
use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::raster::pdftoppm::DEFAULT_DPI;

pub const DEFAULT_FRAMERATE: u32 = 10;
pub const DEFAULT_TARGET_WIDTH: u32 = 1920;
pub const DEFAULT_TARGET_ASPECT_RATIO: f64 = 16.0 / 9.0;
pub const DEFAULT_OUTPUT_NAME: &str = "latex-viz.mkv";

/// Settings for one run over a repository.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Repository to read history from; artifacts and the video are written inside it.
    pub repo: PathBuf,
    pub framerate: u32,
    pub target_width: u32,
    pub target_aspect_ratio: f64,
    pub raster_dpi: u32,
    /// Video file name, relative to `repo`.
    pub output_name: String,
    /// Replace an existing video; when off, an existing file stops the run at the encode stage.
    pub overwrite_video: bool,
}

impl RunConfig {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            framerate: DEFAULT_FRAMERATE,
            target_width: DEFAULT_TARGET_WIDTH,
            target_aspect_ratio: DEFAULT_TARGET_ASPECT_RATIO,
            raster_dpi: DEFAULT_DPI,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            overwrite_video: true,
        }
    }

    pub fn validate(&self) -> TexlapseResult<()> {
        if !self.repo.is_dir() {
            return Err(TexlapseError::invalid_path(format!(
                "'{}' does not exist or is not a directory",
                self.repo.display()
            )));
        }
        if self.framerate == 0 {
            return Err(TexlapseError::validation("framerate must be non-zero"));
        }
        if self.target_width == 0 {
            return Err(TexlapseError::validation("target width must be non-zero"));
        }
        if !(self.target_aspect_ratio.is_finite() && self.target_aspect_ratio > 0.0) {
            return Err(TexlapseError::validation(format!(
                "target aspect ratio must be positive and finite, got {}",
                self.target_aspect_ratio
            )));
        }
        if self.raster_dpi == 0 {
            return Err(TexlapseError::validation("raster dpi must be non-zero"));
        }
        let name = Path::new(&self.output_name);
        if self.output_name.is_empty() || name.is_absolute() || name.components().count() != 1 {
            return Err(TexlapseError::validation(format!(
                "output name must be a plain file name, got '{}'",
                self.output_name
            )));
        }
        Ok(())
    }

    pub fn video_path(&self) -> PathBuf {
        self.repo.join(&self.output_name)
    }

    /// Encoder options for the configured video file.
    pub fn sink_opts(&self) -> FfmpegSinkOpts {
        FfmpegSinkOpts {
            out_path: self.video_path(),
            overwrite: self.overwrite_video,
        }
    }
}

/// Parse an aspect ratio written as `1.777`, `16:9` or `16/9`.
pub fn parse_aspect_ratio(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let value = match s.split_once([':', '/']) {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().map_err(|_| format!("invalid width in '{s}'"))?;
            let h: f64 = h.trim().parse().map_err(|_| format!("invalid height in '{s}'"))?;
            w / h
        }
        None => s.parse().map_err(|_| format!("invalid aspect ratio '{s}'"))?,
    };
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("aspect ratio must be positive, got '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_surface() {
        let cfg = RunConfig::new(".");
        assert_eq!(cfg.framerate, 10);
        assert_eq!(cfg.target_width, 1920);
        assert!((cfg.target_aspect_ratio - 16.0 / 9.0).abs() < 1e-12);
        assert_eq!(cfg.video_path(), Path::new(".").join("latex-viz.mkv"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_catches_bad_values() {
        let missing = RunConfig::new("/definitely/not/a/texlapse/repo");
        assert!(matches!(
            missing.validate(),
            Err(TexlapseError::InvalidPath(_))
        ));

        let mut cfg = RunConfig::new(".");
        cfg.framerate = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = RunConfig::new(".");
        cfg.target_aspect_ratio = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RunConfig::new(".");
        cfg.output_name = "../escape.mkv".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sink_opts_follow_overwrite_setting() {
        let mut cfg = RunConfig::new("repo");
        let opts = cfg.sink_opts();
        assert!(opts.overwrite);
        assert_eq!(opts.out_path, Path::new("repo").join("latex-viz.mkv"));

        cfg.overwrite_video = false;
        cfg.output_name = "history.mp4".to_string();
        let opts = cfg.sink_opts();
        assert!(!opts.overwrite);
        assert_eq!(opts.out_path, Path::new("repo").join("history.mp4"));
    }

    #[test]
    fn aspect_ratio_forms() {
        assert!((parse_aspect_ratio("16:9").unwrap() - 16.0 / 9.0).abs() < 1e-12);
        assert!((parse_aspect_ratio("4/3").unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert!((parse_aspect_ratio(" 1.5 ").unwrap() - 1.5).abs() < 1e-12);
        assert!(parse_aspect_ratio("16:0").is_err());
        assert!(parse_aspect_ratio("-2").is_err());
        assert!(parse_aspect_ratio("wide").is_err());
    }
}
