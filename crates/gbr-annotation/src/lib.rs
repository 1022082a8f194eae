//! Dataset annotation codecs for Go board recognition results.
//!
//! A board hands an [`AnnotationRecord`] to the codec selected by an
//! [`AnnotationFormat`]; the codec owns every format-specific detail. Reading
//! back is limited to [`read_image_reference`], which finds the image an
//! annotation was made for.
//!
//! ```no_run
//! use gbr_annotation::{AnnotationFormat, AnnotationRecord, DatasetContext};
//! use gbr_core::{ImageSize, Stone};
//! use std::path::Path;
//!
//! let black = [Stone::new(40, 40, 9)];
//! let record = AnnotationRecord {
//!     image_file: Path::new("games/board.png"),
//!     source_file: None,
//!     image_size: ImageSize::new(400, 400),
//!     board_size: Some(19),
//!     black: &black,
//!     white: &[],
//! };
//! let codec = AnnotationFormat::PascalVoc.codec(DatasetContext::new("games"));
//! codec.write(&record, Path::new("games/board.xml"))?;
//! # Ok::<(), gbr_annotation::AnnotationError>(())
//! ```

mod error;
mod format;
mod pascal;
mod reference;

pub use error::AnnotationError;
pub use format::{AnnotationCodec, AnnotationFormat, AnnotationRecord, DatasetContext};
pub use pascal::{BndBox, PascalVocCodec};
pub use reference::{image_reference_from_str, read_image_reference};
