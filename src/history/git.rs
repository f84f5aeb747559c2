use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::foundation::process::{describe, output_tail};

/// Ordered commit history plus per-commit source snapshots.
pub trait HistorySource {
    /// Commit identifiers, oldest first. An empty history is valid.
    fn commits(&self) -> TexlapseResult<Vec<String>>;

    /// Extract the tree of `commit` into `dest`, which exists and is empty.
    fn materialize(&self, commit: &str, dest: &Path) -> TexlapseResult<()>;
}

/// [`HistorySource`] backed by the system `git` and `tar` binaries.
#[derive(Clone, Debug)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.path).arg("--no-pager");
        cmd
    }
}

impl HistorySource for GitRepo {
    #[tracing::instrument(skip(self), fields(repo = %self.path.display()))]
    fn commits(&self) -> TexlapseResult<Vec<String>> {
        let mut cmd = self.git();
        cmd.args(["log", "--pretty=format:%H", "--reverse"]);
        tracing::debug!(cmd = %describe(&cmd), "listing commits");

        let out = cmd
            .output()
            .map_err(|e| TexlapseError::history(format!("failed to run git: {e}")))?;
        if !out.status.success() {
            let stderr = output_tail(&out.stderr, 20);
            if is_unborn_branch(&stderr) {
                return Ok(Vec::new());
            }
            return Err(TexlapseError::history(format!(
                "git log exited with status {}: {stderr}",
                out.status
            )));
        }

        Ok(parse_commit_list(&String::from_utf8_lossy(&out.stdout)))
    }

    #[tracing::instrument(skip(self, dest), fields(dest = %dest.display()))]
    fn materialize(&self, commit: &str, dest: &Path) -> TexlapseResult<()> {
        let mut archive = self.git();
        archive
            .args(["archive", "--format=tar", commit])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(cmd = %describe(&archive), "archiving commit");

        let mut git_child = archive.spawn().map_err(|e| {
            TexlapseError::materialize(format!("failed to spawn git archive: {e}"))
        })?;
        let tar_in = git_child
            .stdout
            .take()
            .ok_or_else(|| TexlapseError::materialize("failed to open git stdout (unexpected)"))?;

        let tar_out = Command::new("tar")
            .arg("-x")
            .arg("-C")
            .arg(dest)
            .stdin(Stdio::from(tar_in))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| TexlapseError::materialize(format!("failed to run tar: {e}")))?;

        let git_out = git_child.wait_with_output().map_err(|e| {
            TexlapseError::materialize(format!("failed to wait for git archive: {e}"))
        })?;

        if !git_out.status.success() {
            return Err(TexlapseError::materialize(format!(
                "git archive of {commit} exited with status {}: {}",
                git_out.status,
                output_tail(&git_out.stderr, 20)
            )));
        }
        if !tar_out.status.success() {
            return Err(TexlapseError::materialize(format!(
                "extracting {commit} exited with status {}: {}",
                tar_out.status,
                output_tail(&tar_out.stderr, 20)
            )));
        }
        Ok(())
    }
}

fn parse_commit_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_unborn_branch(stderr: &str) -> bool {
    stderr.contains("does not have any commits yet")
}
