use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed annotation XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("{path}: neither <source> nor <path> names an image")]
    MissingFilename { path: PathBuf },
    #[error("unsupported annotation format: {0}")]
    UnsupportedFormat(String),
}
