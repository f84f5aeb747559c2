use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::foundation::process::{describe, output_tail};

/// Result of one compile attempt.
///
/// A non-zero exit with an artifact is still usable; only a missing artifact skips the commit.
#[derive(Clone, Debug)]
pub struct CompileOutcome {
    pub artifact: Option<PathBuf>,
    pub exit_ok: bool,
    pub log_tail: String,
}

/// Turns a source snapshot into one paginated document.
pub trait DocumentCompiler {
    fn compile(&self, snapshot: &Path) -> TexlapseResult<CompileOutcome>;
}

/// [`DocumentCompiler`] that runs `latexmk -interaction=nonstopmode -pdf` in the snapshot.
#[derive(Clone, Debug)]
pub struct Latexmk {
    program: PathBuf,
}

impl Default for Latexmk {
    fn default() -> Self {
        Self {
            program: PathBuf::from("latexmk"),
        }
    }
}

impl Latexmk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl DocumentCompiler for Latexmk {
    #[tracing::instrument(skip(self, snapshot), fields(snapshot = %snapshot.display()))]
    fn compile(&self, snapshot: &Path) -> TexlapseResult<CompileOutcome> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-interaction=nonstopmode", "-pdf"])
            .current_dir(snapshot);
        tracing::debug!(cmd = %describe(&cmd), "compiling snapshot");

        let out = cmd.output().map_err(|e| {
            TexlapseError::compile(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;

        let mut log = out.stdout;
        log.extend_from_slice(&out.stderr);

        Ok(CompileOutcome {
            artifact: find_pdf(snapshot)?,
            exit_ok: out.status.success(),
            log_tail: output_tail(&log, 20),
        })
    }
}

/// First `*.pdf` directly inside `dir`, by file name.
pub fn find_pdf(dir: &Path) -> TexlapseResult<Option<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("read directory '{}'", dir.display()))?
            .path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs.into_iter().next())
}
