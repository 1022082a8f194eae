use gbr_annotation::AnnotationError;
use gbr_core::{ParamError, PersistError, ScaleError};
use std::path::{Path, PathBuf};

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by a detection engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("{0} does not run detection")]
    Unsupported(&'static str),
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Errors surfaced by [`crate::Board`] operations.
#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("image file not found or unreadable: {}", path.display())]
    ImageNotFound {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no image loaded")]
    NoImage,
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },
    #[error("{}: no image file name could be resolved", path.display())]
    MissingFilename { path: PathBuf },
    #[error("malformed data in {}: {source}", path.display())]
    MalformedPersistedData {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },
    #[error("no output path given and the board has no image file")]
    MissingPath,
    #[error("board has no detection results")]
    NoResults,
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BoardError {
    pub(crate) fn io(path: &Path, source: impl Into<BoxedSource>) -> Self {
        BoardError::IoFailure {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(path: &Path, source: impl Into<BoxedSource>) -> Self {
        BoardError::MalformedPersistedData {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// Classify a JSON codec failure on `path`.
    pub(crate) fn persist(path: &Path, e: PersistError) -> Self {
        if e.is_malformed() {
            Self::malformed(path, e)
        } else {
            Self::io(path, e)
        }
    }

    /// Classify an annotation codec failure on `path`.
    pub(crate) fn annotation(path: &Path, e: AnnotationError) -> Self {
        match e {
            AnnotationError::Io(e) => Self::io(path, e),
            AnnotationError::MissingFilename { path } => BoardError::MissingFilename { path },
            other => Self::malformed(path, other),
        }
    }
}
