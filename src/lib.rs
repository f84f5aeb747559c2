//! Texlapse renders a time-lapse video of a LaTeX document across its git history.
//!
//! For every commit the document is compiled to PDF, the pages are tiled into a fixed-size grid
//! frame, and the frames are encoded into one video:
//!
//! - Enumerate commits with a [`HistorySource`]
//! - Compile each snapshot with a [`DocumentCompiler`]
//! - Plan one [`GridPlan`] for the whole series with [`plan_grid`]
//! - Rasterize and composite each document, then stream the frames into a [`FrameSink`]
//!
//! [`Pipeline`] wires these stages together over an [`ArtifactStore`] so interrupted runs resume.
#![forbid(unsafe_code)]

mod foundation;

pub mod compile;
pub mod composite;
pub mod encode;
pub mod history;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod store;

pub use crate::foundation::error::{TexlapseError, TexlapseResult};
pub use crate::foundation::process::is_tool_on_path;

pub use crate::compile::latexmk::{CompileOutcome, DocumentCompiler, Latexmk};
pub use crate::composite::frame::{BACKGROUND, compose_frame};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::history::git::{GitRepo, HistorySource};
pub use crate::layout::grid::{GridPlan, plan_grid};
pub use crate::pdf::inspect::{DocumentGeometry, LopdfReader, PageReader, PageSize};
pub use crate::pipeline::config::{RunConfig, parse_aspect_ratio};
pub use crate::pipeline::run::{Pipeline, RunReport};
pub use crate::raster::pdftoppm::{Pdftoppm, Rasterizer};
pub use crate::store::artifacts::{ArtifactKey, ArtifactStore};
