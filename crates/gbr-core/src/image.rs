//! Size types and a small grayscale raster used for debug artifacts.

use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Board raster shape in `(height, width)` order.
///
/// This is the order used when asking the renderer for a synthetic board and
/// when deriving a board from stored geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardShape {
    pub height: u32,
    pub width: u32,
}

impl BoardShape {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

impl From<ImageSize> for BoardShape {
    fn from(size: ImageSize) -> Self {
        Self::new(size.height, size.width)
    }
}

/// Shape of the board synthesised when nothing else is known.
pub const DEFAULT_BOARD_SHAPE: BoardShape = BoardShape {
    height: 500,
    width: 500,
};

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Wrap a row-major buffer. Returns `None` if the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width as u32, self.height as u32)
    }

    /// Bilinear resample to `width x height`.
    pub fn resized(&self, width: usize, height: usize) -> GrayImage {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let src = self.view();
        let sx = self.width as f32 / width.max(1) as f32;
        let sy = self.height as f32 / height.max(1) as f32;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            // pixel centres map onto pixel centres
            let fy = (y as f32 + 0.5) * sy - 0.5;
            for x in 0..width {
                let fx = (x as f32 + 0.5) * sx - 0.5;
                data.push(sample_bilinear_u8(&src, fx.max(0.0), fy.max(0.0)));
            }
        }
        GrayImage {
            width,
            height,
            data,
        }
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, src.width as i32 - 1);
    let y = y.clamp(0, src.height as i32 - 1);
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    if src.width == 0 || src.height == 0 {
        return 0.0;
    }
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(GrayImage::from_raw(3, 2, vec![0; 5]).is_none());
        assert!(GrayImage::from_raw(3, 2, vec![0; 6]).is_some());
    }

    #[test]
    fn constant_image_stays_constant_when_resized() {
        let img = GrayImage::filled(40, 30, 77);
        let small = img.resized(10, 7);
        assert_eq!(small.size(), ImageSize::new(10, 7));
        assert!(small.data.iter().all(|&v| v == 77));
    }

    #[test]
    fn bilinear_interpolates_between_neighbours() {
        let img = GrayImage::from_raw(2, 1, vec![0, 100]).expect("2x1");
        let v = sample_bilinear(&img.view(), 0.5, 0.0);
        assert!((v - 50.0).abs() < 1e-4);
    }

    #[test]
    fn board_shape_swaps_axis_order() {
        let shape = BoardShape::from(ImageSize::new(640, 480));
        assert_eq!(shape.height, 480);
        assert_eq!(shape.width, 640);
        assert_eq!(shape.size(), ImageSize::new(640, 480));
    }
}
