//! Format selection and the codec interface.

use crate::error::AnnotationError;
use crate::pascal::PascalVocCodec;
use gbr_core::{ImageSize, Stone, StoneColor};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported annotation formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnnotationFormat {
    #[default]
    PascalVoc,
}

impl AnnotationFormat {
    pub const ALL: [AnnotationFormat; 1] = [AnnotationFormat::PascalVoc];

    pub fn name(self) -> &'static str {
        match self {
            AnnotationFormat::PascalVoc => "pascal",
        }
    }

    /// Codec writing this format, scoped to one dataset directory.
    pub fn codec(self, ctx: DatasetContext) -> Box<dyn AnnotationCodec> {
        match self {
            AnnotationFormat::PascalVoc => Box::new(PascalVocCodec::new(ctx)),
        }
    }
}

impl fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotationFormat {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pascal" | "pascal_voc" | "voc" => Ok(AnnotationFormat::PascalVoc),
            _ => Err(AnnotationError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Directory scope a codec writes relative to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetContext {
    /// Directory holding the source images.
    pub src_dir: PathBuf,
}

impl DatasetContext {
    pub fn new(src_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
        }
    }

    /// Context for the directory containing `image_file`.
    pub fn for_image(image_file: &Path) -> Self {
        let dir = image_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir)
    }

    /// Last component of the source directory, used as the dataset folder name.
    pub fn folder_name(&self) -> String {
        self.src_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One annotated image as handed over by the board.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationRecord<'a> {
    pub image_file: &'a Path,
    /// Original photograph, when the image on disk is a resized copy.
    pub source_file: Option<&'a Path>,
    pub image_size: ImageSize,
    pub board_size: Option<u32>,
    pub black: &'a [Stone],
    pub white: &'a [Stone],
}

impl AnnotationRecord<'_> {
    /// Image the annotation refers back to.
    pub fn reference(&self) -> &Path {
        self.source_file.unwrap_or(self.image_file)
    }

    /// All stones with their colour, black first.
    pub fn stones(&self) -> impl Iterator<Item = (StoneColor, &Stone)> + '_ {
        self.black
            .iter()
            .map(|s| (StoneColor::Black, s))
            .chain(self.white.iter().map(|s| (StoneColor::White, s)))
    }
}

/// Writes annotation files in one concrete format.
pub trait AnnotationCodec {
    fn format(&self) -> AnnotationFormat;

    /// Default file extension, without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, record: &AnnotationRecord<'_>, path: &Path) -> Result<(), AnnotationError>;
}
