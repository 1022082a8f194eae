//! Core types for Go board recognition.
//!
//! This crate holds everything that does not need a decoded colour image:
//! detection parameters, the result set of one detection pass, rescaling of
//! results, and the JSON codecs for parameter and board-info files. It does
//! *not* depend on any concrete image decoder or detector.

mod image;
mod io;
mod jgf;
mod logger;
mod params;
mod result;
mod scale;

pub use image::{
    sample_bilinear, sample_bilinear_u8, BoardShape, GrayImage, GrayImageView, ImageSize,
    DEFAULT_BOARD_SHAPE,
};
pub use io::{load_json, write_json, PersistError};
pub use jgf::{jgf_to_results, results_to_jgf, JgfDocument, JGF_BOARD_MARGIN};
pub use params::{
    BoardSizeParam, ParamError, ParamKey, ParamOverrides, ParamSpec, ParamValue, Params,
};
pub use result::{
    DebugArtifact, DebugTag, DetectionSummary, GridGeometry, GridPoint, ResultSet, Stone,
    StoneColor,
};
pub use scale::{fit_within, ScaleError, ScaleFactors};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, init_tracing_with_level};

pub use logger::{error_count, init_with_level, note_error, reset_error_count};
