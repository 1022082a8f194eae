//! Rescaling of detection results when the underlying image is resized.
//!
//! Scaling is pure: it returns a new [`ResultSet`] or an error, never a
//! half-updated one. Callers swap the image and the results only after the
//! scaled results exist.

use crate::image::ImageSize;
use crate::result::{DebugArtifact, GridGeometry, ResultSet, Stone};
use nalgebra::Point2;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ScaleError {
    #[error("cannot rescale between {from:?} and {to:?}: empty image")]
    EmptyImage { from: ImageSize, to: ImageSize },
    #[error("scale factors must be finite and > 0 (sx={sx}, sy={sy})")]
    InvalidFactors { sx: f64, sy: f64 },
    #[error("max size must be > 0")]
    ZeroMaxSize,
    #[error("scaled coordinate {0} does not fit in i32")]
    Overflow(f64),
}

/// Independent per-axis scale factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub sx: f64,
    pub sy: f64,
}

impl ScaleFactors {
    pub fn new(sx: f64, sy: f64) -> Result<Self, ScaleError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(sx) || !ok(sy) {
            return Err(ScaleError::InvalidFactors { sx, sy });
        }
        Ok(Self { sx, sy })
    }

    /// Factors mapping an image of size `from` onto one of size `to`.
    pub fn between(from: ImageSize, to: ImageSize) -> Result<Self, ScaleError> {
        if from.is_empty() || to.is_empty() {
            return Err(ScaleError::EmptyImage { from, to });
        }
        Self::new(
            f64::from(to.width) / f64::from(from.width),
            f64::from(to.height) / f64::from(from.height),
        )
    }

    pub fn inverse(&self) -> Self {
        Self {
            sx: 1.0 / self.sx,
            sy: 1.0 / self.sy,
        }
    }

    /// Radius has no axis; the larger factor keeps circles plausible under
    /// non-uniform scaling.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.sx.max(self.sy)
    }

    pub fn is_identity(&self) -> bool {
        self.sx == 1.0 && self.sy == 1.0
    }

    fn apply_size(&self, size: ImageSize) -> ImageSize {
        let w = (f64::from(size.width) * self.sx).round().max(1.0) as u32;
        let h = (f64::from(size.height) * self.sy).round().max(1.0) as u32;
        ImageSize::new(w, h)
    }
}

/// Size whose longer side equals `max_size`, keeping the aspect ratio.
///
/// Images are never upscaled: a size already within `max_size` is returned
/// unchanged.
pub fn fit_within(size: ImageSize, max_size: u32) -> Result<ImageSize, ScaleError> {
    if max_size == 0 {
        return Err(ScaleError::ZeroMaxSize);
    }
    let longest = size.max_side();
    if longest <= max_size {
        return Ok(size);
    }
    let k = f64::from(max_size) / f64::from(longest);
    let w = (f64::from(size.width) * k).round().clamp(1.0, f64::from(max_size)) as u32;
    let h = (f64::from(size.height) * k).round().clamp(1.0, f64::from(max_size)) as u32;
    Ok(ImageSize::new(w, h))
}

fn scale_coord(v: i32, k: f64) -> Result<i32, ScaleError> {
    let scaled = (f64::from(v) * k).round();
    if scaled < f64::from(i32::MIN) || scaled > f64::from(i32::MAX) {
        return Err(ScaleError::Overflow(scaled));
    }
    Ok(scaled as i32)
}

fn scale_stones(stones: &[Stone], f: &ScaleFactors) -> Result<Vec<Stone>, ScaleError> {
    stones
        .iter()
        .map(|s| {
            Ok(Stone {
                x: scale_coord(s.x, f.sx)?,
                y: scale_coord(s.y, f.sy)?,
                radius: scale_coord(s.radius, f.radius())?,
            })
        })
        .collect()
}

fn scale_geometry(g: &GridGeometry, f: &ScaleFactors) -> GridGeometry {
    let (sx, sy) = (f.sx as f32, f.sy as f32);
    let scale_pt = |p: Point2<f32>| Point2::new(p.x * sx, p.y * sy);
    GridGeometry {
        edges: [scale_pt(g.edges[0]), scale_pt(g.edges[1])],
        spacing: [g.spacing[0] * sx, g.spacing[1] * sy],
        ..*g
    }
}

fn resample_debug(
    debug: &[DebugArtifact],
    size: Option<ImageSize>,
    f: &ScaleFactors,
) -> Vec<DebugArtifact> {
    debug
        .iter()
        .map(|a| {
            let target = size.unwrap_or_else(|| f.apply_size(a.image.size()));
            DebugArtifact {
                tag: a.tag,
                image: a
                    .image
                    .resized(target.width as usize, target.height as usize),
            }
        })
        .collect()
}

impl ResultSet {
    /// Scale every coordinate by `factors`.
    ///
    /// Stone centres are rounded per axis and the radius uses the larger
    /// factor. Edges and spacing keep sub-pixel precision.
    pub fn scaled_by(&self, factors: &ScaleFactors) -> Result<ResultSet, ScaleError> {
        let black = scale_stones(&self.black, factors)?;
        let white = scale_stones(&self.white, factors)?;
        let image_size = self.image_size.map(|s| factors.apply_size(s));
        Ok(ResultSet {
            black,
            white,
            geometry: self.geometry.as_ref().map(|g| scale_geometry(g, factors)),
            image_size,
            debug: resample_debug(&self.debug, image_size, factors),
        })
    }

    /// Rescale results computed on an image of size `from` to one of size `to`.
    pub fn rescaled(&self, from: ImageSize, to: ImageSize) -> Result<ResultSet, ScaleError> {
        let factors = ScaleFactors::between(from, to)?;
        let mut out = self.scaled_by(&factors)?;
        out.image_size = Some(to);
        for artifact in &mut out.debug {
            if artifact.image.size() != to {
                artifact.image = artifact
                    .image
                    .resized(to.width as usize, to.height as usize);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;
    use crate::result::DebugTag;
    use approx::assert_abs_diff_eq;

    fn sample() -> ResultSet {
        ResultSet {
            black: vec![Stone::new(100, 200, 12), Stone::new(37, 411, 9)],
            white: vec![Stone::new(250, 60, 11)],
            geometry: Some(GridGeometry {
                edges: [Point2::new(20.0, 22.0), Point2::new(380.0, 382.0)],
                spacing: [20.0, 20.0],
                num_cross_h: 19,
                num_cross_w: 19,
                board_size: 19,
            }),
            image_size: Some(ImageSize::new(400, 400)),
            debug: vec![DebugArtifact {
                tag: DebugTag::Edges,
                image: GrayImage::filled(400, 400, 10),
            }],
        }
    }

    #[test]
    fn factors_are_per_axis() {
        let f = ScaleFactors::between(ImageSize::new(400, 200), ImageSize::new(200, 150))
            .expect("valid");
        assert_abs_diff_eq!(f.sx, 0.5);
        assert_abs_diff_eq!(f.sy, 0.75);
        assert_abs_diff_eq!(f.radius(), 0.75);
    }

    #[test]
    fn empty_sizes_and_bad_factors_are_rejected() {
        assert!(ScaleFactors::between(ImageSize::new(0, 10), ImageSize::new(5, 5)).is_err());
        assert!(ScaleFactors::new(0.0, 1.0).is_err());
        assert!(ScaleFactors::new(f64::NAN, 1.0).is_err());
        assert!(ScaleFactors::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn stones_round_and_radius_uses_larger_factor() {
        let f = ScaleFactors::new(0.5, 0.25).expect("valid");
        let r = sample().scaled_by(&f).expect("scaled");
        assert_eq!(r.black[0], Stone::new(50, 50, 6));
        // 37 * 0.5 = 18.5 rounds away from zero; 411 * 0.25 = 102.75
        assert_eq!(r.black[1], Stone::new(19, 103, 5));
        assert_eq!(r.white[0], Stone::new(125, 15, 6));
        assert_eq!(r.image_size, Some(ImageSize::new(200, 100)));
    }

    #[test]
    fn geometry_scales_independently_per_axis() {
        let f = ScaleFactors::new(2.0, 0.5).expect("valid");
        let g = sample().scaled_by(&f).expect("scaled").geometry.expect("geometry");
        assert_abs_diff_eq!(g.edges[0].x, 40.0);
        assert_abs_diff_eq!(g.edges[0].y, 11.0);
        assert_abs_diff_eq!(g.edges[1].x, 760.0);
        assert_abs_diff_eq!(g.edges[1].y, 191.0);
        assert_abs_diff_eq!(g.spacing[0], 40.0);
        assert_abs_diff_eq!(g.spacing[1], 10.0);
        assert_eq!(g.board_size, 19);
    }

    #[test]
    fn scaling_then_inverse_is_close_to_identity() {
        let original = sample();
        for (sx, sy) in [(0.5, 0.25), (2.0, 1.5), (0.37, 0.81), (1.0, 3.0)] {
            let f = ScaleFactors::new(sx, sy).expect("valid");
            let back = original
                .scaled_by(&f)
                .and_then(|r| r.scaled_by(&f.inverse()))
                .expect("round trip");
            // one rounding step in each direction, amplified by the inverse
            let tol_x = 0.5 / sx + 0.5;
            let tol_y = 0.5 / sy + 0.5;
            for (a, b) in original.black.iter().zip(&back.black) {
                assert!((a.x - b.x).abs() as f64 <= tol_x, "{a:?} vs {b:?}");
                assert!((a.y - b.y).abs() as f64 <= tol_y, "{a:?} vs {b:?}");
            }
            for (a, b) in original.white.iter().zip(&back.white) {
                assert!((a.x - b.x).abs() as f64 <= tol_x, "{a:?} vs {b:?}");
                assert!((a.y - b.y).abs() as f64 <= tol_y, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn rescaled_resamples_debug_artifacts() {
        let r = sample()
            .rescaled(ImageSize::new(400, 400), ImageSize::new(100, 100))
            .expect("rescaled");
        assert_eq!(r.image_size, Some(ImageSize::new(100, 100)));
        assert_eq!(r.debug[0].image.size(), ImageSize::new(100, 100));
        assert_eq!(r.debug[0].tag, DebugTag::Edges);
    }

    #[test]
    fn fit_within_never_upscales() {
        let small = ImageSize::new(300, 200);
        assert_eq!(fit_within(small, 500).expect("fits"), small);
        assert_eq!(
            fit_within(ImageSize::new(1000, 500), 500).expect("fits"),
            ImageSize::new(500, 250)
        );
        assert_eq!(
            fit_within(ImageSize::new(300, 1200), 400).expect("fits"),
            ImageSize::new(100, 400)
        );
        assert!(fit_within(small, 0).is_err());
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let r = ResultSet {
            black: vec![Stone::new(i32::MAX / 2, 0, 1)],
            ..ResultSet::default()
        };
        let f = ScaleFactors::new(4.0, 1.0).expect("valid");
        assert!(matches!(r.scaled_by(&f), Err(ScaleError::Overflow(_))));
    }
}
