//! Output of one detection pass.

use crate::image::{GrayImage, ImageSize};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stone colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoneColor {
    Black,
    White,
}

impl StoneColor {
    /// One-letter code used in Go notation (`B` / `W`).
    pub fn code(self) -> char {
        match self {
            StoneColor::Black => 'B',
            StoneColor::White => 'W',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StoneColor::Black => "black",
            StoneColor::White => "white",
        }
    }
}

impl fmt::Display for StoneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A detected stone: centre and radius in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stone {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

impl Stone {
    pub fn new(x: i32, y: i32, radius: i32) -> Self {
        Self { x, y, radius }
    }

    /// True if `(x, y)` lies inside the stone's disc.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let dx = i128::from(x) - i128::from(self.x);
        let dy = i128::from(y) - i128::from(self.y);
        let r = i128::from(self.radius);
        dx * dx + dy * dy <= r * r
    }
}

/// Board intersection in grid coordinates, `(0, 0)` at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub col: u32,
    pub row: u32,
}

impl GridPoint {
    /// Go notation for this intersection, e.g. `D4`.
    ///
    /// Columns are lettered from the left skipping `I`; rows are numbered from
    /// the bottom edge. Returns `None` outside a `board_size` board.
    pub fn label(&self, board_size: u32) -> Option<String> {
        if self.col >= board_size || self.row >= board_size || board_size > 25 {
            return None;
        }
        let letter = (b'A' + self.col as u8 + u8::from(self.col >= 8)) as char;
        Some(format!("{}{}", letter, board_size - self.row))
    }
}

/// Grid geometry found by one detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Top-left and bottom-right intersections in image coordinates.
    pub edges: [Point2<f32>; 2],
    /// Horizontal and vertical grid pitch in pixels.
    pub spacing: [f32; 2],
    pub num_cross_h: u32,
    pub num_cross_w: u32,
    pub board_size: u32,
}

impl GridGeometry {
    /// Nearest intersection to an image point, if it falls on the board.
    pub fn intersection(&self, x: f32, y: f32) -> Option<GridPoint> {
        let [sx, sy] = self.spacing;
        if !(sx > 0.0 && sy > 0.0) {
            return None;
        }
        let col = ((x - self.edges[0].x) / sx).round();
        let row = ((y - self.edges[0].y) / sy).round();
        let n = self.board_size as f32;
        if col < 0.0 || row < 0.0 || col >= n || row >= n {
            return None;
        }
        Some(GridPoint {
            col: col as u32,
            row: row as u32,
        })
    }
}

/// Debug raster produced by a detection stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugTag {
    Gray,
    Edges,
    Lines,
    Threshold(StoneColor),
    Morphology(StoneColor),
    Watershed(StoneColor),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugArtifact {
    pub tag: DebugTag,
    pub image: GrayImage,
}

/// Structured output of one detection pass over one image.
///
/// Stone lists are always present; an empty detection is an empty list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub black: Vec<Stone>,
    pub white: Vec<Stone>,
    pub geometry: Option<GridGeometry>,
    /// Size of the image the detection ran on.
    pub image_size: Option<ImageSize>,
    pub debug: Vec<DebugArtifact>,
}

/// Compact numeric summary of a result set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub black_stones: usize,
    pub white_stones: usize,
    pub edges: Option<[Point2<f32>; 2]>,
    /// Spacing rounded to two decimals.
    pub spacing: Option<[f32; 2]>,
    pub num_cross_h: Option<u32>,
    pub num_cross_w: Option<u32>,
    pub board_size: Option<u32>,
    pub image_size: Option<ImageSize>,
}

impl ResultSet {
    pub fn stones(&self, color: StoneColor) -> &[Stone] {
        match color {
            StoneColor::Black => &self.black,
            StoneColor::White => &self.white,
        }
    }

    pub fn board_size(&self) -> Option<u32> {
        self.geometry.map(|g| g.board_size)
    }

    pub fn debug_artifact(&self, tag: DebugTag) -> Option<&GrayImage> {
        self.debug.iter().find(|a| a.tag == tag).map(|a| &a.image)
    }

    /// Copy with hidden colours emptied. Debug artifacts are not copied.
    pub fn filtered(&self, show_black: bool, show_white: bool) -> ResultSet {
        ResultSet {
            black: if show_black {
                self.black.clone()
            } else {
                Vec::new()
            },
            white: if show_white {
                self.white.clone()
            } else {
                Vec::new()
            },
            geometry: self.geometry,
            image_size: self.image_size,
            debug: Vec::new(),
        }
    }

    pub fn summary(&self) -> DetectionSummary {
        let round2 = |v: f32| (v * 100.0).round() / 100.0;
        DetectionSummary {
            black_stones: self.black.len(),
            white_stones: self.white.len(),
            edges: self.geometry.map(|g| g.edges),
            spacing: self
                .geometry
                .map(|g| [round2(g.spacing[0]), round2(g.spacing[1])]),
            num_cross_h: self.geometry.map(|g| g.num_cross_h),
            num_cross_w: self.geometry.map(|g| g.num_cross_w),
            board_size: self.board_size(),
            image_size: self.image_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry {
            edges: [Point2::new(20.0, 30.0), Point2::new(380.0, 390.0)],
            spacing: [20.0, 20.0],
            num_cross_h: 19,
            num_cross_w: 19,
            board_size: 19,
        }
    }

    #[test]
    fn stone_contains_its_disc_only() {
        let s = Stone::new(100, 100, 10);
        assert!(s.contains(100, 100));
        assert!(s.contains(110, 100));
        assert!(s.contains(107, 107));
        assert!(!s.contains(108, 108));
        assert!(!s.contains(111, 100));
    }

    #[test]
    fn containment_handles_extreme_coordinates() {
        let s = Stone::new(50, 50, 10);
        assert!(!s.contains(i32::MIN, 0));
        assert!(!s.contains(i32::MAX, i32::MIN));

        let huge = Stone::new(i32::MIN, i32::MAX, i32::MAX);
        assert!(huge.contains(i32::MIN, 0));
        assert!(!huge.contains(i32::MAX, i32::MIN));
    }

    #[test]
    fn intersection_snaps_to_nearest_cross() {
        let g = geometry();
        assert_eq!(g.intersection(21.0, 29.0), Some(GridPoint { col: 0, row: 0 }));
        assert_eq!(g.intersection(78.0, 52.0), Some(GridPoint { col: 3, row: 1 }));
        assert_eq!(g.intersection(0.0, 0.0), None);
        assert_eq!(g.intersection(400.0, 30.0), None);
    }

    #[test]
    fn labels_skip_letter_i_and_count_rows_from_bottom() {
        assert_eq!(GridPoint { col: 0, row: 18 }.label(19).as_deref(), Some("A1"));
        assert_eq!(GridPoint { col: 3, row: 15 }.label(19).as_deref(), Some("D4"));
        assert_eq!(GridPoint { col: 8, row: 0 }.label(19).as_deref(), Some("J19"));
        assert_eq!(GridPoint { col: 18, row: 0 }.label(19).as_deref(), Some("T19"));
        assert_eq!(GridPoint { col: 9, row: 0 }.label(9), None);
    }

    #[test]
    fn filtered_empties_hidden_colours() {
        let r = ResultSet {
            black: vec![Stone::new(1, 2, 3)],
            white: vec![Stone::new(4, 5, 6)],
            geometry: Some(geometry()),
            ..ResultSet::default()
        };
        let only_white = r.filtered(false, true);
        assert!(only_white.black.is_empty());
        assert_eq!(only_white.white, r.white);
        assert_eq!(only_white.geometry, r.geometry);
    }

    #[test]
    fn summary_rounds_spacing() {
        let mut g = geometry();
        g.spacing = [20.123, 19.876];
        let r = ResultSet {
            geometry: Some(g),
            ..ResultSet::default()
        };
        let s = r.summary();
        assert_eq!(s.spacing, Some([20.12, 19.88]));
        assert_eq!(s.board_size, Some(19));
        assert_eq!(s.black_stones, 0);
    }
}
