use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{TexlapseError, TexlapseResult};

pub const DOCUMENT_DIR: &str = "latex-viz-pdfs";
pub const FRAME_DIR: &str = "latex-viz-imgs";
pub const SCRATCH_DIR: &str = "latex-viz-tmp";

/// Stable key for one commit's artifacts: its position in the history plus its identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub index: usize,
    pub commit: String,
}

impl ArtifactKey {
    pub fn new(index: usize, commit: impl Into<String>) -> Self {
        Self {
            index,
            commit: commit.into(),
        }
    }

    pub fn document_file_name(&self) -> String {
        format!("{}-{}.pdf", self.index, self.commit)
    }

    /// Frames are keyed by index alone so they sort into playback order.
    pub fn frame_file_name(&self) -> String {
        format!("{:05}.png", self.index)
    }
}

/// On-disk store for compiled documents and composited frames.
///
/// Artifacts are addressed by [`ArtifactKey`] and are only ever written through a `.partial`
/// file followed by a rename, so an existing artifact is always complete. That makes
/// existence the resumability check.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    documents: PathBuf,
    frames: PathBuf,
    scratch: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the store rooted at `root`, discarding partial writes left by
    /// an interrupted run.
    pub fn open(root: impl AsRef<Path>) -> TexlapseResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(TexlapseError::invalid_path(format!(
                "'{}' does not exist or is not a directory",
                root.display()
            )));
        }
        let store = Self {
            documents: root.join(DOCUMENT_DIR),
            frames: root.join(FRAME_DIR),
            scratch: root.join(SCRATCH_DIR),
        };
        for dir in [&store.documents, &store.frames] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create artifact directory '{}'", dir.display()))?;
            sweep_partials(dir)?;
        }
        Ok(store)
    }

    pub fn document_dir(&self) -> &Path {
        &self.documents
    }

    pub fn document_path(&self, key: &ArtifactKey) -> PathBuf {
        self.documents.join(key.document_file_name())
    }

    pub fn frame_path(&self, key: &ArtifactKey) -> PathBuf {
        self.frames.join(key.frame_file_name())
    }

    pub fn has_document(&self, key: &ArtifactKey) -> bool {
        self.document_path(key).is_file()
    }

    pub fn has_frame(&self, key: &ArtifactKey) -> bool {
        self.frame_path(key).is_file()
    }

    /// Copy a compiled document into the store under `key`.
    pub fn publish_document(&self, key: &ArtifactKey, src: &Path) -> TexlapseResult<PathBuf> {
        let dst = self.document_path(key);
        let partial = partial_path(&dst);
        std::fs::copy(src, &partial).with_context(|| {
            format!("copy '{}' to '{}'", src.display(), partial.display())
        })?;
        commit_partial(&partial, &dst)?;
        Ok(dst)
    }

    /// Write a frame under `key`; `write` receives the temporary path to fill.
    pub fn publish_frame(
        &self,
        key: &ArtifactKey,
        write: impl FnOnce(&Path) -> TexlapseResult<()>,
    ) -> TexlapseResult<PathBuf> {
        let dst = self.frame_path(key);
        let partial = partial_path(&dst);
        write(&partial)?;
        commit_partial(&partial, &dst)?;
        Ok(dst)
    }

    /// Recreate the scratch directory empty and return it.
    pub fn fresh_scratch(&self) -> TexlapseResult<PathBuf> {
        self.clear_scratch()?;
        std::fs::create_dir_all(&self.scratch)
            .with_context(|| format!("create scratch directory '{}'", self.scratch.display()))?;
        Ok(self.scratch.clone())
    }

    pub fn clear_scratch(&self) -> TexlapseResult<()> {
        if self.scratch.exists() {
            std::fs::remove_dir_all(&self.scratch).with_context(|| {
                format!("remove scratch directory '{}'", self.scratch.display())
            })?;
        }
        Ok(())
    }
}

fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dst.with_file_name(name)
}

fn sweep_partials(dir: &Path) -> TexlapseResult<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read directory '{}'", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "partial") && path.is_file() {
            tracing::debug!(path = %path.display(), "removing interrupted write");
            std::fs::remove_file(&path)
                .with_context(|| format!("remove '{}'", path.display()))?;
        }
    }
    Ok(())
}

fn commit_partial(partial: &Path, dst: &Path) -> TexlapseResult<()> {
    std::fs::rename(partial, dst)
        .with_context(|| format!("rename '{}' to '{}'", partial.display(), dst.display()))?;
    Ok(())
}
