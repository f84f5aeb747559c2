use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;
use image::RgbImage;

use crate::foundation::error::{TexlapseError, TexlapseResult};
use crate::foundation::process::{describe, output_tail};

/// Renders every page of a document to a bitmap, in page order.
pub trait Rasterizer {
    /// `scratch` is an existing empty directory the rasterizer may use.
    fn rasterize(&self, pdf: &Path, scratch: &Path) -> TexlapseResult<Vec<RgbImage>>;
}

pub const DEFAULT_DPI: u32 = 200;

/// [`Rasterizer`] backed by poppler's `pdftoppm`.
#[derive(Clone, Debug)]
pub struct Pdftoppm {
    pub dpi: u32,
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl Pdftoppm {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl Rasterizer for Pdftoppm {
    #[tracing::instrument(skip(self, pdf, scratch), fields(pdf = %pdf.display(), dpi = self.dpi))]
    fn rasterize(&self, pdf: &Path, scratch: &Path) -> TexlapseResult<Vec<RgbImage>> {
        if self.dpi == 0 {
            return Err(TexlapseError::validation("raster dpi must be non-zero"));
        }

        let mut cmd = Command::new("pdftoppm");
        cmd.args(["-r", &self.dpi.to_string(), "-png"])
            .arg(pdf)
            .arg(scratch.join("page"));
        tracing::debug!(cmd = %describe(&cmd), "rasterizing document");

        let out = cmd.output().map_err(|e| {
            TexlapseError::raster(format!(
                "failed to spawn pdftoppm (is poppler installed and on PATH?): {e}"
            ))
        })?;
        if !out.status.success() {
            return Err(TexlapseError::raster(format!(
                "pdftoppm exited with status {} for '{}': {}",
                out.status,
                pdf.display(),
                output_tail(&out.stderr, 20)
            )));
        }

        let mut pages = Vec::new();
        for path in page_files(scratch)? {
            let img = image::open(&path)
                .with_context(|| format!("decode page image '{}'", path.display()))?;
            pages.push(img.to_rgb8());
        }
        Ok(pages)
    }
}

/// `page-<n>.png` files in `dir`, ordered by page number.
///
/// `pdftoppm` zero-pads the page number to the width of the page count, so lexical order is
/// not reliable across tool versions; sort numerically.
pub fn page_files(dir: &Path) -> TexlapseResult<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    let mut numbered = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("read directory '{}'", dir.display()))?
            .path();
        if let Some(n) = page_number(&path) {
            numbered.push((n, path));
        }
    }
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_parses_padded_suffixes() {
        assert_eq!(page_number(Path::new("/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/x/page-3.ppm")), None);
        assert_eq!(page_number(Path::new("/x/cover.png")), None);
    }

    #[test]
    fn page_files_sort_numerically() {
        let dir = std::env::temp_dir().join(format!(
            "texlapse_pdftoppm_sort_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["page-10.png", "page-9.png", "page-1.png", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let files = page_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-9.png", "page-10.png"]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn zero_dpi_is_rejected() {
        let err = Pdftoppm::new(0)
            .rasterize(Path::new("doc.pdf"), Path::new("."))
            .unwrap_err();
        assert!(matches!(err, TexlapseError::Validation(_)));
    }
}
