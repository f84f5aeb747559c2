use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::foundation::process::{describe, ensure_parent_dir, is_tool_on_path};

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video path; the container follows the extension.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-framerate",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);
        // yuv420p needs even dimensions; grid frames can be odd, so pad with the page background.
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2:0:0:white"]);
        }
        cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(&self.opts.out_path);
        cmd
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> TexlapseResult<()> {
        cfg.validate()?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(TexlapseError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(TexlapseError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let mut cmd = self.command(&cfg);
        tracing::debug!(cmd = %describe(&cmd), "starting encoder");

        let mut child = cmd.spawn().map_err(|e| {
            TexlapseError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TexlapseError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TexlapseError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &RgbImage) -> TexlapseResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TexlapseError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(TexlapseError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(TexlapseError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TexlapseError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            TexlapseError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> TexlapseResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TexlapseError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            TexlapseError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TexlapseError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| TexlapseError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(TexlapseError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    /// A sink dropped between `begin` and `end` kills and reaps its encoder.
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg", "-version")
}
