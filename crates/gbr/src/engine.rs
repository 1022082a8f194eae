//! Detection engine contract and the default board renderer.

use crate::error::EngineError;
use gbr_core::{BoardShape, GridGeometry, Params, ResultSet, Stone};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use nalgebra::Point2;

const BOARD_COLOR: Rgb<u8> = Rgb([220, 179, 92]);
const LINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const BLACK_STONE: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE_STONE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK_BOX: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE_BOX: Rgb<u8> = Rgb([0, 0, 255]);

/// Board size drawn when no geometry is known.
const DEFAULT_RENDER_SIZE: u32 = 19;

/// Pixel-level recogniser plugged into a [`crate::Board`].
///
/// Implementations must be deterministic for identical image bytes and
/// parameters, and must not keep state between calls that changes results.
pub trait DetectionEngine {
    /// Detect grid geometry and stones on `image`.
    fn detect(&self, image: &RgbImage, params: &Params) -> Result<ResultSet, EngineError>;

    /// Draw a synthetic board of `shape`, with the stones of `results`.
    fn render(&self, shape: BoardShape, results: Option<&ResultSet>, show_boxes: bool) -> RgbImage {
        render_board(shape, results, show_boxes)
    }

    /// Stone whose disc contains `(x, y)`.
    fn locate(&self, x: i32, y: i32, stones: &[Stone]) -> Option<Stone> {
        stones.iter().copied().find(|s| s.contains(x, y))
    }
}

/// Engine that can draw and look up stones but has no detector linked.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOnlyEngine;

impl DetectionEngine for RenderOnlyEngine {
    fn detect(&self, _image: &RgbImage, _params: &Params) -> Result<ResultSet, EngineError> {
        Err(EngineError::Unsupported("render-only engine"))
    }
}

/// Grid used when a board is drawn without detection results: 19x19 with a
/// 5% margin on each side.
pub fn default_geometry(shape: BoardShape) -> GridGeometry {
    let (w, h) = (shape.width as f32, shape.height as f32);
    let margin = (w.min(h) * 0.05).max(1.0);
    let n = DEFAULT_RENDER_SIZE;
    let steps = (n - 1) as f32;
    GridGeometry {
        edges: [
            Point2::new(margin, margin),
            Point2::new(w - margin, h - margin),
        ],
        spacing: [(w - 2.0 * margin) / steps, (h - 2.0 * margin) / steps],
        num_cross_h: n,
        num_cross_w: n,
        board_size: n,
    }
}

/// Wood-coloured board with grid lines between the edges and stones as
/// filled discs. `show_boxes` outlines every stone's detection box.
pub fn render_board(shape: BoardShape, results: Option<&ResultSet>, show_boxes: bool) -> RgbImage {
    let mut img = RgbImage::from_pixel(shape.width.max(1), shape.height.max(1), BOARD_COLOR);
    let geometry = results
        .and_then(|r| r.geometry)
        .unwrap_or_else(|| default_geometry(shape));
    draw_grid(&mut img, &geometry);

    let Some(results) = results else {
        return img;
    };
    let (w, h) = img.dimensions();
    for s in &results.black {
        if let Some((x, y, r)) = canvas_disc(s, w, h) {
            draw_filled_circle_mut(&mut img, (x, y), r, BLACK_STONE);
        }
    }
    for s in &results.white {
        if let Some((x, y, r)) = canvas_disc(s, w, h) {
            draw_filled_circle_mut(&mut img, (x, y), r, WHITE_STONE);
            draw_hollow_circle_mut(&mut img, (x, y), r, LINE_COLOR);
        }
    }
    if show_boxes {
        for (stones, color) in [(&results.black, BLACK_BOX), (&results.white, WHITE_BOX)] {
            for rect in stones.iter().filter_map(|s| stone_box(s, w, h)) {
                draw_hollow_rect_mut(&mut img, rect, color);
            }
        }
    }
    img
}

/// Centre and radius of a stone that overlaps a `w x h` canvas.
///
/// Stones that miss the canvas, or lie further away than the canvas is wide
/// and high, are skipped.
fn canvas_disc(s: &Stone, w: u32, h: u32) -> Option<(i32, i32, i32)> {
    let (w, h) = (i64::from(w), i64::from(h));
    let reach = w + h;
    let (x, y) = (i64::from(s.x), i64::from(s.y));
    let r = i64::from(s.radius.max(1));
    let visible = x + r >= 0 && y + r >= 0 && x - r < w && y - r < h;
    let bounded = r <= reach && x >= -reach && y >= -reach && x <= w + reach && y <= h + reach;
    if !(visible && bounded) {
        return None;
    }
    Some((
        i32::try_from(x).ok()?,
        i32::try_from(y).ok()?,
        i32::try_from(r).ok()?,
    ))
}

fn draw_grid(img: &mut RgbImage, g: &GridGeometry) {
    let [near, far] = g.edges;
    let [sx, sy] = g.spacing;
    for i in 0..g.num_cross_w {
        let x = near.x + i as f32 * sx;
        draw_line_segment_mut(img, (x, near.y), (x, far.y), LINE_COLOR);
    }
    for i in 0..g.num_cross_h {
        let y = near.y + i as f32 * sy;
        draw_line_segment_mut(img, (near.x, y), (far.x, y), LINE_COLOR);
    }
}

/// Detection box of a stone, with sides beyond the canvas moved just outside it.
fn stone_box(s: &Stone, w: u32, h: u32) -> Option<Rect> {
    let (x, y, r) = canvas_disc(s, w, h)?;
    let (x, y, r) = (i64::from(x), i64::from(y), i64::from(r));
    let left = (x - r).max(-1);
    let top = (y - r).max(-1);
    let right = (x + r).min(i64::from(w));
    let bottom = (y + r).min(i64::from(h));
    Some(
        Rect::at(i32::try_from(left).ok()?, i32::try_from(top).ok()?).of_size(
            u32::try_from(right - left + 1).ok()?,
            u32::try_from(bottom - top + 1).ok()?,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbr_core::StoneColor;

    fn results() -> ResultSet {
        ResultSet {
            black: vec![Stone::new(30, 30, 8)],
            white: vec![Stone::new(70, 70, 8)],
            ..ResultSet::default()
        }
    }

    #[test]
    fn render_draws_stones_in_their_colours() {
        let img = render_board(BoardShape::new(100, 120), Some(&results()), false);
        assert_eq!(img.dimensions(), (120, 100));
        assert_eq!(*img.get_pixel(30, 30), BLACK_STONE);
        assert_eq!(*img.get_pixel(71, 69), WHITE_STONE);
        assert_eq!(*img.get_pixel(50, 2), BOARD_COLOR);
    }

    #[test]
    fn boxes_are_drawn_only_on_request() {
        let r = results();
        let plain = render_board(BoardShape::new(100, 100), Some(&r), false);
        let boxed = render_board(BoardShape::new(100, 100), Some(&r), true);
        assert_ne!(*plain.get_pixel(22, 22), BLACK_BOX);
        assert_eq!(*boxed.get_pixel(22, 22), BLACK_BOX);
    }

    #[test]
    fn extreme_stones_are_clipped_or_skipped() {
        let r = ResultSet {
            black: vec![
                Stone::new(i32::MAX, i32::MIN, i32::MAX),
                Stone::new(i32::MIN, 10, 5),
                Stone::new(50, 50, i32::MAX),
            ],
            white: vec![Stone::new(98, 98, 6)],
            ..ResultSet::default()
        };
        let img = render_board(BoardShape::new(100, 100), Some(&r), true);
        assert_eq!(img.dimensions(), (100, 100));
        // box of the corner stone runs along the image border
        assert_eq!(*img.get_pixel(92, 97), WHITE_BOX);
        assert_eq!(stone_box(&Stone::new(i32::MIN, i32::MIN, i32::MAX), 100, 100), None);
    }

    #[test]
    fn default_locate_uses_disc_containment() {
        let engine = RenderOnlyEngine;
        let r = results();
        assert_eq!(engine.locate(33, 27, r.stones(StoneColor::Black)), Some(r.black[0]));
        assert_eq!(engine.locate(45, 45, r.stones(StoneColor::Black)), None);
        assert!(engine.detect(&RgbImage::new(4, 4), &Params::default()).is_err());
    }
}
