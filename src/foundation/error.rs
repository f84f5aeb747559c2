pub type TexlapseResult<T> = Result<T, TexlapseError>;

/// Every failure a run can surface.
///
/// Recoverable per-commit conditions (a compiler that exits non-zero, a commit that produces no
/// PDF) are not errors; the pipeline logs and counts them instead.
#[derive(thiserror::Error, Debug)]
pub enum TexlapseError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("history error: {0}")]
    History(String),

    #[error("materialization error: {0}")]
    Materialize(String),

    #[error("compile error: {0}")]
    Compile(String),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("empty corpus: {0}")]
    EmptyCorpus(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TexlapseError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    pub fn materialize(msg: impl Into<String>) -> Self {
        Self::Materialize(msg.into())
    }

    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    pub fn pdf(msg: impl Into<String>) -> Self {
        Self::Pdf(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn empty_corpus(msg: impl Into<String>) -> Self {
        Self::EmptyCorpus(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TexlapseError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            TexlapseError::invalid_path("x")
                .to_string()
                .contains("invalid path:")
        );
        assert!(
            TexlapseError::history("x")
                .to_string()
                .contains("history error:")
        );
        assert!(
            TexlapseError::materialize("x")
                .to_string()
                .contains("materialization error:")
        );
        assert!(
            TexlapseError::empty_corpus("x")
                .to_string()
                .contains("empty corpus:")
        );
        assert!(
            TexlapseError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TexlapseError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
