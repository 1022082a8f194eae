//! Board-info (JGF) documents: the on-disk form of a detection result.
//!
//! ```json
//! {
//!   "black": [[120, 80, 11]],
//!   "board_size": 19,
//!   "edges": { "0": [20.0, 22.0], "1": [380.0, 382.0] },
//!   "image_file": "games/board.png",
//!   "image_size": [400, 400],
//!   "num_cross_h": 19,
//!   "num_cross_w": 19,
//!   "spacing": [20.0, 20.0],
//!   "white": []
//! }
//! ```
//!
//! Edge points and stones are `[x, y]` / `[x, y, r]` in image pixels;
//! `image_size` is `[height, width]`. Fields are declared in sorted order so
//! written files are stable under diff.

use crate::image::{BoardShape, ImageSize};
use crate::io::{self, PersistError};
use crate::result::{GridGeometry, ResultSet, Stone};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Margin in pixels added beyond the far grid corner when a board image is
/// synthesised from stored geometry. Tuned for 19x19 boards at the
/// resolutions the files were produced at; not derived from the geometry.
pub const JGF_BOARD_MARGIN: u32 = 14;

const NEAR_EDGE: &str = "0";
const FAR_EDGE: &str = "1";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JgfDocument {
    #[serde(default)]
    pub black: Vec<[i32; 3]>,
    #[serde(default)]
    pub board_size: Option<u32>,
    #[serde(default)]
    pub edges: BTreeMap<String, [f32; 2]>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub image_size: Option<[u32; 2]>,
    #[serde(default)]
    pub num_cross_h: Option<u32>,
    #[serde(default)]
    pub num_cross_w: Option<u32>,
    #[serde(default)]
    pub spacing: Option<[f32; 2]>,
    #[serde(default)]
    pub white: Vec<[i32; 3]>,
}

fn stone_to_jgf(s: &Stone) -> [i32; 3] {
    [s.x, s.y, s.radius]
}

fn stone_from_jgf(&[x, y, r]: &[i32; 3]) -> Stone {
    Stone::new(x, y, r)
}

/// Convert a result set into its document form.
pub fn results_to_jgf(results: &ResultSet, image_file: Option<&str>) -> JgfDocument {
    let mut doc = JgfDocument {
        black: results.black.iter().map(stone_to_jgf).collect(),
        white: results.white.iter().map(stone_to_jgf).collect(),
        image_file: image_file.map(str::to_owned),
        image_size: results.image_size.map(|s| [s.height, s.width]),
        ..JgfDocument::default()
    };
    if let Some(g) = &results.geometry {
        doc.edges.insert(NEAR_EDGE.to_string(), [g.edges[0].x, g.edges[0].y]);
        doc.edges.insert(FAR_EDGE.to_string(), [g.edges[1].x, g.edges[1].y]);
        doc.spacing = Some(g.spacing);
        doc.num_cross_h = Some(g.num_cross_h);
        doc.num_cross_w = Some(g.num_cross_w);
        doc.board_size = Some(g.board_size);
    }
    doc
}

/// Convert a document back into a result set.
///
/// Grid geometry is restored only when both edges, the spacing and the board
/// size are present; cross counts default to the board size. A recorded
/// `image_size` with a zero side is a schema error.
pub fn jgf_to_results(doc: &JgfDocument) -> Result<ResultSet, PersistError> {
    let image_size = match doc.image_size {
        Some([h, w]) if h == 0 || w == 0 => {
            return Err(PersistError::Schema(format!(
                "image_size [{h}, {w}] has an empty side"
            )))
        }
        Some([h, w]) => Some(ImageSize::new(w, h)),
        None => None,
    };
    let geometry = match (
        doc.edges.get(NEAR_EDGE),
        doc.edges.get(FAR_EDGE),
        doc.spacing,
        doc.board_size,
    ) {
        (Some(near), Some(far), Some(spacing), Some(board_size)) => Some(GridGeometry {
            edges: [Point2::new(near[0], near[1]), Point2::new(far[0], far[1])],
            spacing,
            num_cross_h: doc.num_cross_h.unwrap_or(board_size),
            num_cross_w: doc.num_cross_w.unwrap_or(board_size),
            board_size,
        }),
        _ => {
            log::debug!("board info has no complete grid geometry");
            None
        }
    };

    Ok(ResultSet {
        black: doc.black.iter().map(stone_from_jgf).collect(),
        white: doc.white.iter().map(stone_from_jgf).collect(),
        geometry,
        image_size,
        debug: Vec::new(),
    })
}

impl JgfDocument {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        io::load_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        io::write_json(self, path)
    }

    /// Shape of a synthetic board that holds the whole stored grid:
    /// `(far.y + margin, far.x + margin)`.
    pub fn synthetic_shape(&self) -> Result<BoardShape, PersistError> {
        let far = self
            .edges
            .get(FAR_EDGE)
            .ok_or_else(|| PersistError::Schema("edges[\"1\"] is missing".to_string()))?;
        let to_px = |v: f32| -> Result<u32, PersistError> {
            if !v.is_finite() || v < 0.0 || v > (u32::MAX - JGF_BOARD_MARGIN) as f32 {
                return Err(PersistError::Schema(format!(
                    "edges[\"1\"] has an invalid coordinate {v}"
                )));
            }
            Ok(v.round() as u32 + JGF_BOARD_MARGIN)
        };
        Ok(BoardShape::new(to_px(far[1])?, to_px(far[0])?))
    }
}
