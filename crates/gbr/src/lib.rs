//! Go board recognition.
//!
//! A [`Board`] owns one image, its detection [`Params`] and at most one
//! [`ResultSet`]. It keeps the three consistent across loads, synthetic
//! board generation and resizing, and moves them between their on-disk forms:
//! parameters JSON, board-info (`.jgf`) JSON and dataset annotations.
//!
//! Pixel-level recognition is not part of this crate: plug a detector in by
//! implementing [`DetectionEngine`]. [`RenderOnlyEngine`] draws boards and
//! looks up stones but cannot detect.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gbr::{Board, BoardInfoImage, RenderOnlyEngine};
//!
//! # fn main() -> Result<(), gbr::BoardError> {
//! let mut board = Board::new(RenderOnlyEngine);
//! let results = board.load_board_info("games/board.jgf", BoardInfoImage::Generated)?;
//! println!("{} black, {} white", results.black.len(), results.white.len());
//! board.save(Some("games/board_synthetic.png".as_ref()), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `gbr::core`: parameters, result sets, rescaling, board-info JSON.
//! - `gbr::annotation`: annotation formats and codecs.
//! - [`Board`], [`DetectionEngine`]: orchestration and the detector contract.

pub use gbr_annotation as annotation;
pub use gbr_core as core;

pub use gbr_annotation::AnnotationFormat;
pub use gbr_core::{
    BoardShape, DebugTag, GridGeometry, ImageSize, ParamKey, ParamOverrides, ParamValue, Params,
    ResultSet, Stone, StoneColor,
};

mod board;
mod engine;
mod error;

pub use board::{
    Board, BoardInfoImage, Detection, LoadOutcome, BOARD_INFO_EXTENSION, PARAMS_EXTENSION,
};
pub use engine::{default_geometry, render_board, DetectionEngine, RenderOnlyEngine};
pub use error::{BoardError, EngineError};
