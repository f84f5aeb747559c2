use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::compile::latexmk::{DocumentCompiler, Latexmk};
use crate::composite::frame::compose_frame;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::history::git::{GitRepo, HistorySource};
use crate::layout::grid::{GridPlan, plan_grid};
use crate::pdf::inspect::{LopdfReader, PageReader};
use crate::pipeline::config::RunConfig;
use crate::raster::pdftoppm::{Pdftoppm, Rasterizer};
use crate::store::artifacts::{ArtifactKey, ArtifactStore};

/// Summary of a completed run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RunReport {
    pub commits: usize,
    pub documents: usize,
    pub documents_compiled: usize,
    pub documents_reused: usize,
    pub compile_warnings: usize,
    /// Commits that produced no usable document.
    pub skipped_commits: Vec<String>,
    pub max_page_count: u32,
    pub page_aspect_ratio: f64,
    pub plan: GridPlan,
    pub frames_written: usize,
    pub frames_reused: usize,
    pub video: PathBuf,
}

#[derive(Debug, Default)]
struct CompileStats {
    compiled: usize,
    reused: usize,
    warnings: usize,
}

/// A document that made it into the series.
#[derive(Clone, Debug)]
struct SurveyedDocument {
    key: ArtifactKey,
    path: PathBuf,
    page_count: u32,
}

#[derive(Debug)]
struct Survey {
    documents: Vec<SurveyedDocument>,
    max_page_count: u32,
    page_aspect_ratio: Option<f64>,
}

/// Drives one run: compile every commit, plan the grid, composite frames, encode the video.
///
/// Each stage skips work whose artifact is already in the [`ArtifactStore`], so an interrupted
/// run picks up where it stopped.
pub struct Pipeline {
    history: Box<dyn HistorySource>,
    compiler: Box<dyn DocumentCompiler>,
    reader: Box<dyn PageReader>,
    rasterizer: Box<dyn Rasterizer>,
}

impl Pipeline {
    /// Pipeline over the system tools: `git`, `latexmk`, `pdftoppm`.
    pub fn system(cfg: &RunConfig) -> Self {
        Self {
            history: Box::new(GitRepo::new(&cfg.repo)),
            compiler: Box::new(Latexmk::new()),
            reader: Box::new(LopdfReader),
            rasterizer: Box::new(Pdftoppm::new(cfg.raster_dpi)),
        }
    }

    pub fn new(
        history: Box<dyn HistorySource>,
        compiler: Box<dyn DocumentCompiler>,
        reader: Box<dyn PageReader>,
        rasterizer: Box<dyn Rasterizer>,
    ) -> Self {
        Self {
            history,
            compiler,
            reader,
            rasterizer,
        }
    }

    pub fn run(&self, cfg: &RunConfig, sink: &mut dyn FrameSink) -> TexlapseResult<RunReport> {
        cfg.validate()?;
        let store = ArtifactStore::open(&cfg.repo)?;

        let commits = self.history.commits()?;
        tracing::info!("found {} commits", commits.len());

        let compile_stats = self.compile_stage(&store, &commits)?;

        let survey = self.survey_stage(&store, &commits);
        if survey.max_page_count == 0 {
            return Err(TexlapseError::empty_corpus(
                "all generated PDFs seem to be empty",
            ));
        }
        let page_aspect_ratio = survey.page_aspect_ratio.ok_or_else(|| {
            TexlapseError::empty_corpus("no document reported a first page size")
        })?;
        tracing::info!(
            "the maximum page count is {} and the page aspect ratio is {:.2}",
            survey.max_page_count,
            page_aspect_ratio
        );

        let plan = plan_grid(
            survey.max_page_count,
            page_aspect_ratio,
            cfg.target_width,
            cfg.target_aspect_ratio,
        )?;
        tracing::info!(
            "using a {}x{} (aspect ratio {:.2}) grid to visualize the pages",
            plan.col_count,
            plan.row_count,
            plan.grid_aspect_ratio(page_aspect_ratio)
        );

        let (frames_written, frames_reused) =
            self.composite_stage(&store, &survey.documents, &plan, commits.len())?;

        encode_stage(&store, &survey.documents, &plan, cfg.framerate, sink)?;

        let kept: BTreeSet<usize> = survey.documents.iter().map(|d| d.key.index).collect();
        let skipped_commits = commits
            .iter()
            .enumerate()
            .filter(|(i, _)| !kept.contains(i))
            .map(|(_, c)| c.clone())
            .collect();

        Ok(RunReport {
            commits: commits.len(),
            documents: survey.documents.len(),
            documents_compiled: compile_stats.compiled,
            documents_reused: compile_stats.reused,
            compile_warnings: compile_stats.warnings,
            skipped_commits,
            max_page_count: survey.max_page_count,
            page_aspect_ratio,
            plan,
            frames_written,
            frames_reused,
            video: cfg.video_path(),
        })
    }

    #[tracing::instrument(skip_all, fields(commits = commits.len()))]
    fn compile_stage(
        &self,
        store: &ArtifactStore,
        commits: &[String],
    ) -> TexlapseResult<CompileStats> {
        let total = commits.len();
        let mut stats = CompileStats::default();

        for (i, commit) in commits.iter().enumerate() {
            let key = ArtifactKey::new(i, commit.as_str());
            if store.has_document(&key) {
                tracing::info!("PDF for commit {}/{total} already exists, skipping", i + 1);
                stats.reused += 1;
                continue;
            }

            let scratch = store.fresh_scratch()?;
            self.history.materialize(commit, &scratch)?;

            tracing::info!("compiling commit {}/{total} ({commit})", i + 1);
            let outcome = self.compiler.compile(&scratch)?;
            if !outcome.exit_ok {
                stats.warnings += 1;
                tracing::warn!(
                    commit = %commit,
                    log = %outcome.log_tail,
                    "compiler finished with errors, still checking for an output PDF"
                );
            }
            let Some(artifact) = outcome.artifact else {
                tracing::warn!(commit = %commit, "cannot find the generated PDF, skipping this commit");
                continue;
            };
            store.publish_document(&key, &artifact)?;
            stats.compiled += 1;
        }

        store.clear_scratch()?;
        Ok(stats)
    }

    /// Read every stored document in commit order. Unreadable documents are skipped like
    /// commits that never compiled.
    #[tracing::instrument(skip_all)]
    fn survey_stage(&self, store: &ArtifactStore, commits: &[String]) -> Survey {
        let mut survey = Survey {
            documents: Vec::new(),
            max_page_count: 0,
            page_aspect_ratio: None,
        };

        for (i, commit) in commits.iter().enumerate() {
            let key = ArtifactKey::new(i, commit.as_str());
            if !store.has_document(&key) {
                continue;
            }
            let path = store.document_path(&key);
            let geometry = match self.reader.inspect(&path) {
                Ok(g) => g,
                Err(err) => {
                    tracing::warn!(commit = %commit, error = %err, "cannot read PDF, skipping this commit");
                    continue;
                }
            };

            survey.max_page_count = survey.max_page_count.max(geometry.page_count);
            if survey.page_aspect_ratio.is_none()
                && geometry.page_count > 0
                && let Some(size) = geometry.first_page
            {
                survey.page_aspect_ratio = Some(size.aspect_ratio());
            }
            survey.documents.push(SurveyedDocument {
                key,
                path,
                page_count: geometry.page_count,
            });
        }
        survey
    }

    #[tracing::instrument(skip_all, fields(documents = documents.len()))]
    fn composite_stage(
        &self,
        store: &ArtifactStore,
        documents: &[SurveyedDocument],
        plan: &GridPlan,
        total: usize,
    ) -> TexlapseResult<(usize, usize)> {
        let mut written = 0;
        let mut reused = 0;

        for doc in documents {
            let n = doc.key.index + 1;
            if store.has_frame(&doc.key) {
                tracing::info!("image for commit {n}/{total} already exists, skipping");
                reused += 1;
                continue;
            }

            tracing::info!("creating image for commit {n}/{total} ({})", doc.key.commit);
            // pdftoppm rejects the empty page range of a 0-page document.
            let pages = if doc.page_count == 0 {
                Vec::new()
            } else {
                let scratch = store.fresh_scratch()?;
                self.rasterizer.rasterize(&doc.path, &scratch)?
            };
            let frame = compose_frame(&pages, plan);
            store.publish_frame(&doc.key, |path| {
                frame
                    .save_with_format(path, image::ImageFormat::Png)
                    .with_context(|| format!("write png '{}'", path.display()))?;
                Ok(())
            })?;
            written += 1;
        }

        store.clear_scratch()?;
        Ok((written, reused))
    }
}

/// Stream stored frames in commit order into `sink`.
///
/// Every frame's size is checked before the sink starts, so a stale frame never leaves a
/// half-written video behind.
#[tracing::instrument(skip_all, fields(frames = documents.len(), fps = framerate))]
fn encode_stage(
    store: &ArtifactStore,
    documents: &[SurveyedDocument],
    plan: &GridPlan,
    framerate: u32,
    sink: &mut dyn FrameSink,
) -> TexlapseResult<()> {
    for doc in documents {
        let path = store.frame_path(&doc.key);
        let dims = image::image_dimensions(&path)
            .with_context(|| format!("read frame header '{}'", path.display()))?;
        check_frame_size(&path, dims, plan)?;
    }

    sink.begin(SinkConfig {
        width: plan.frame_width,
        height: plan.frame_height,
        fps: framerate,
    })?;

    for (seq, doc) in documents.iter().enumerate() {
        let path = store.frame_path(&doc.key);
        let frame = image::open(&path)
            .with_context(|| format!("decode frame '{}'", path.display()))?
            .to_rgb8();
        check_frame_size(&path, frame.dimensions(), plan)?;
        sink.push_frame(seq as u64, &frame)?;
    }

    sink.end()
}

fn check_frame_size(
    path: &Path,
    (width, height): (u32, u32),
    plan: &GridPlan,
) -> TexlapseResult<()> {
    if (width, height) == (plan.frame_width, plan.frame_height) {
        return Ok(());
    }
    Err(TexlapseError::validation(format!(
        "frame '{}' is {width}x{height} but the grid needs {}x{}; it was made with different \
         layout options, delete it to regenerate",
        path.display(),
        plan.frame_width,
        plan.frame_height
    )))
}
