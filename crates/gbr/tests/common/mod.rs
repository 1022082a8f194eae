#![allow(dead_code)]

use gbr::{DetectionEngine, EngineError, GridGeometry, ImageSize, Params, ResultSet, Stone};
use image::{Rgb, RgbImage};
use nalgebra::Point2;
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Engine returning a fixed result set and counting detect calls.
pub struct FixedEngine {
    pub results: ResultSet,
    pub calls: Cell<usize>,
}

impl FixedEngine {
    pub fn new(results: ResultSet) -> Self {
        Self {
            results,
            calls: Cell::new(0),
        }
    }
}

impl DetectionEngine for FixedEngine {
    fn detect(&self, _image: &RgbImage, _params: &Params) -> Result<ResultSet, EngineError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.results.clone())
    }
}

/// 9x9 grid on a 200x200 image, without a recorded image size.
pub fn sample_results() -> ResultSet {
    ResultSet {
        black: vec![Stone::new(40, 40, 9), Stone::new(100, 60, 9)],
        white: vec![Stone::new(140, 140, 9)],
        geometry: Some(GridGeometry {
            edges: [Point2::new(20.0, 20.0), Point2::new(180.0, 180.0)],
            spacing: [20.0, 20.0],
            num_cross_h: 9,
            num_cross_w: 9,
            board_size: 9,
        }),
        image_size: None,
        debug: Vec::new(),
    }
}

/// Write a plain PNG and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([200u8, 160, 90]))
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("save test image");
    path
}

pub fn write_text(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write test file");
    path
}

pub fn image_dims(path: &Path) -> (u32, u32) {
    let img = image::open(path).expect("open written image");
    (img.width(), img.height())
}

pub fn recorded_size(results: &ResultSet) -> ImageSize {
    results.image_size.expect("image size recorded")
}
