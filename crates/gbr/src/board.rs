//! The board: one image, its parameters and at most one detection result.

use crate::engine::DetectionEngine;
use crate::error::BoardError;
use gbr_annotation::{read_image_reference, AnnotationFormat, AnnotationRecord, DatasetContext};
use gbr_core::{
    fit_within, jgf_to_results, note_error, results_to_jgf, BoardShape, DebugArtifact,
    DetectionSummary, ImageSize, JgfDocument, ParamOverrides, Params, ResultSet, Stone,
    StoneColor, DEFAULT_BOARD_SHAPE,
};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Extension of the parameters file stored next to an image.
pub const PARAMS_EXTENSION: &str = "json";
/// Extension of the board-info file stored next to an image.
pub const BOARD_INFO_EXTENSION: &str = "jgf";

/// Detection state of a board.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Detection {
    /// Detection has not run on the current image.
    #[default]
    Unprocessed,
    /// The image is synthetic; detection does not apply.
    NotApplicable,
    Processed(ResultSet),
}

impl Detection {
    pub fn results(&self) -> Option<&ResultSet> {
        match self {
            Detection::Processed(r) => Some(r),
            _ => None,
        }
    }
}

/// What [`Board::load_image`] did besides reading the image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Parameters taken from the sibling parameters file, if one was applied.
    pub params_applied: Option<ParamOverrides>,
}

/// Image to pair with a loaded board-info file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BoardInfoImage {
    /// Synthesise a board large enough to hold the stored grid.
    #[default]
    Generated,
    /// Load the photograph named in the file. `path_override` replaces its
    /// directory and keeps the base name.
    Original { path_override: Option<PathBuf> },
}

/// Image and parameters read from disk but not yet committed to a board.
struct StagedImage {
    image: RgbImage,
    params: Params,
    params_applied: Option<ParamOverrides>,
}

/// A Go board image with its detection parameters and results.
pub struct Board<E> {
    engine: E,
    image: Option<RgbImage>,
    image_file: Option<PathBuf>,
    source_file: Option<PathBuf>,
    generated: bool,
    params: Params,
    detection: Detection,
}

fn logged<T>(r: Result<T, BoardError>) -> Result<T, BoardError> {
    r.inspect_err(|e| note_error(format_args!("{e}")))
}

fn image_size(img: &RgbImage) -> ImageSize {
    ImageSize::new(img.width(), img.height())
}

/// `file` moved into `dir`, keeping its base name.
fn override_dir(file: &Path, dir: Option<&Path>) -> PathBuf {
    match (dir, file.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file.to_path_buf(),
    }
}

impl<E: DetectionEngine> Board<E> {
    /// Empty board: no image, default parameters.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            image: None,
            image_file: None,
            source_file: None,
            generated: false,
            params: Params::default(),
            detection: Detection::Unprocessed,
        }
    }

    /// Board holding a synthetic image of `shape` (defaults to
    /// [`DEFAULT_BOARD_SHAPE`]).
    pub fn with_generated(engine: E, shape: Option<BoardShape>) -> Self {
        let mut board = Self::new(engine);
        board.generate(shape.unwrap_or(DEFAULT_BOARD_SHAPE));
        board
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    /// Path of the current image; `None` for a generated board.
    pub fn image_file(&self) -> Option<&Path> {
        self.image_file.as_deref()
    }

    /// Path of the photograph the board was first loaded from.
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Merge `overrides` into the parameters, returning what was applied.
    pub fn set_params(&mut self, overrides: &ParamOverrides) -> ParamOverrides {
        let (params, applied) = self.params.with_overrides(overrides);
        self.params = params;
        applied
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.detection.results()
    }

    pub fn black_stones(&self) -> Option<&[Stone]> {
        self.results().map(|r| r.black.as_slice())
    }

    pub fn white_stones(&self) -> Option<&[Stone]> {
        self.results().map(|r| r.white.as_slice())
    }

    pub fn debug_artifacts(&self) -> Option<&[DebugArtifact]> {
        self.results().map(|r| r.debug.as_slice())
    }

    pub fn summary(&self) -> Option<DetectionSummary> {
        self.results().map(ResultSet::summary)
    }

    /// `(height, width)` of the current image.
    pub fn board_shape(&self) -> Option<BoardShape> {
        self.image.as_ref().map(|img| image_size(img).into())
    }

    /// Detected board size.
    pub fn board_size(&self) -> Option<u32> {
        self.results().and_then(ResultSet::board_size)
    }

    /// Load an image from disk, replacing the current one.
    ///
    /// With `with_params`, a sibling `<stem>.json` parameters file is merged
    /// into the current parameters when it exists. Previous results are
    /// dropped; `auto_process` runs detection right away. On failure the
    /// board is left unchanged.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, path), fields(path = %path.as_ref().display()))
    )]
    pub fn load_image(
        &mut self,
        path: impl AsRef<Path>,
        with_params: bool,
        auto_process: bool,
    ) -> Result<LoadOutcome, BoardError> {
        let path = path.as_ref();
        let staged = self.read_image(path, with_params)?;
        let outcome = self.commit_image(path, staged, Detection::Unprocessed);

        if auto_process {
            self.process()?;
        }
        Ok(outcome)
    }

    /// Read an image and, with `with_params`, merge its sibling parameters
    /// file into a copy of the current parameters. Nothing is committed.
    fn read_image(&self, path: &Path, with_params: bool) -> Result<StagedImage, BoardError> {
        log::info!("loading {}", path.display());
        let image = logged(image::open(path).map_err(|source| BoardError::ImageNotFound {
            path: path.to_path_buf(),
            source,
        }))?
        .to_rgb8();

        let mut params = self.params.clone();
        let mut params_applied = None;
        let params_file = path.with_extension(PARAMS_EXTENSION);
        if with_params && params_file.is_file() {
            let overrides = logged(
                ParamOverrides::load_json(&params_file)
                    .map_err(|e| BoardError::persist(&params_file, e)),
            )?;
            let (merged, applied) = params.with_overrides(&overrides);
            log::info!(
                "applied {} parameters from {}",
                applied.len(),
                params_file.display()
            );
            params = merged;
            params_applied = Some(applied);
        }
        Ok(StagedImage {
            image,
            params,
            params_applied,
        })
    }

    fn commit_image(
        &mut self,
        path: &Path,
        staged: StagedImage,
        detection: Detection,
    ) -> LoadOutcome {
        self.image = Some(staged.image);
        self.image_file = Some(path.to_path_buf());
        self.source_file = Some(path.to_path_buf());
        self.generated = false;
        self.params = staged.params;
        self.detection = detection;
        LoadOutcome {
            params_applied: staged.params_applied,
        }
    }

    /// Replace the image with a synthetic board of `shape`, drawn with the
    /// current results if there are any.
    pub fn generate(&mut self, shape: BoardShape) {
        let seed = self.detection.results().cloned();
        self.generate_from(shape, seed.as_ref());
    }

    fn generate_from(&mut self, shape: BoardShape, seed: Option<&ResultSet>) {
        log::debug!("generating {}x{} board", shape.width, shape.height);
        self.image = Some(self.engine.render(shape, seed, false));
        self.image_file = None;
        self.generated = true;
        self.detection = Detection::NotApplicable;
    }

    /// Write the image, optionally shrinking the board so its longer side is
    /// at most `max_size`. Returns the path written.
    ///
    /// Without `path` the image is written over its current file. The shrunk
    /// image and results replace the board's only once the write succeeded.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, path)))]
    pub fn save(
        &mut self,
        path: Option<&Path>,
        max_size: Option<u32>,
    ) -> Result<PathBuf, BoardError> {
        if self.image.is_none() {
            return logged(Err(BoardError::NoImage));
        }
        let target = logged(
            path.map(Path::to_path_buf)
                .or_else(|| self.image_file.clone())
                .ok_or(BoardError::MissingPath),
        )?;
        let shrunk = match max_size {
            Some(max_size) => self.shrunk(max_size)?,
            None => None,
        };

        log::info!("saving image to {}", target.display());
        let img = match &shrunk {
            Some((img, _)) => img,
            None => logged(self.image.as_ref().ok_or(BoardError::NoImage))?,
        };
        logged(img.save(&target).map_err(|e| BoardError::io(&target, e)))?;

        if let Some((img, detection)) = shrunk {
            self.image = Some(img);
            self.detection = detection;
        }
        self.image_file = Some(target.clone());
        self.generated = false;
        Ok(target)
    }

    /// Read a parameters file and merge its known keys. Returns the values
    /// that were applied.
    pub fn load_params(&mut self, path: impl AsRef<Path>) -> Result<ParamOverrides, BoardError> {
        let path = path.as_ref();
        let overrides =
            logged(ParamOverrides::load_json(path).map_err(|e| BoardError::persist(path, e)))?;
        Ok(self.set_params(&overrides))
    }

    /// Write all parameters, by default next to the image as `<stem>.json`.
    pub fn save_params(&self, path: Option<&Path>) -> Result<PathBuf, BoardError> {
        let target = logged(self.default_path(path, PARAMS_EXTENSION))?;
        logged(
            self.params
                .write_json(&target)
                .map_err(|e| BoardError::persist(&target, e)),
        )?;
        log::info!("parameters saved to {}", target.display());
        Ok(target)
    }

    /// Load a board-info file and return the results it holds.
    ///
    /// With [`BoardInfoImage::Generated`] the board gets a synthetic image of
    /// `(far.y + 14, far.x + 14)` and, being generated, keeps no results. With
    /// [`BoardInfoImage::Original`] the referenced photograph is loaded together
    /// with its sibling parameters file, and the stored results become the
    /// board's results, rescaled if the photograph size differs from the
    /// recorded one. On failure the board is left unchanged.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, path), fields(path = %path.as_ref().display()))
    )]
    pub fn load_board_info(
        &mut self,
        path: impl AsRef<Path>,
        image: BoardInfoImage,
    ) -> Result<ResultSet, BoardError> {
        let path = path.as_ref();
        let doc = logged(JgfDocument::load_json(path).map_err(|e| BoardError::persist(path, e)))?;
        let results = logged(jgf_to_results(&doc).map_err(|e| BoardError::persist(path, e)))?;

        match image {
            BoardInfoImage::Generated => {
                let shape = logged(
                    doc.synthetic_shape()
                        .map_err(|e| BoardError::persist(path, e)),
                )?;
                self.generate_from(shape, Some(&results));
                self.source_file = doc.image_file.map(PathBuf::from);
                Ok(results)
            }
            BoardInfoImage::Original { path_override } => {
                let file = logged(doc.image_file.as_deref().ok_or_else(|| {
                    BoardError::MissingFilename {
                        path: path.to_path_buf(),
                    }
                }))?;
                let file = override_dir(Path::new(file), path_override.as_deref());
                let staged = self.read_image(&file, true)?;

                let actual = image_size(&staged.image);
                let results = match results.image_size {
                    Some(stored) if stored != actual => {
                        log::info!("rescaling stored results from {stored:?} to {actual:?}");
                        logged(
                            results
                                .rescaled(stored, actual)
                                .map_err(|e| BoardError::malformed(path, e)),
                        )?
                    }
                    _ => ResultSet {
                        image_size: Some(actual),
                        ..results
                    },
                };
                self.commit_image(&file, staged, Detection::Processed(results.clone()));
                Ok(results)
            }
        }
    }

    /// Write the current results, by default next to the image as
    /// `<stem>.jgf`.
    pub fn save_board_info(&self, path: Option<&Path>) -> Result<PathBuf, BoardError> {
        let results = logged(self.results().ok_or(BoardError::NoResults))?;
        let target = logged(self.default_path(path, BOARD_INFO_EXTENSION))?;
        let image_file = self.image_file.as_deref().map(|p| p.to_string_lossy());
        let doc = results_to_jgf(results, image_file.as_deref());
        logged(
            doc.write_json(&target)
                .map_err(|e| BoardError::persist(&target, e)),
        )?;
        log::info!("board info saved to {}", target.display());
        Ok(target)
    }

    /// Load the image an annotation file refers to.
    ///
    /// `<source>` is preferred over `<path>`. If neither names an image the
    /// board is left unchanged.
    pub fn load_annotation(
        &mut self,
        path: impl AsRef<Path>,
        path_override: Option<&Path>,
        auto_process: bool,
    ) -> Result<LoadOutcome, BoardError> {
        let path = path.as_ref();
        let file = logged(read_image_reference(path).map_err(|e| BoardError::annotation(path, e)))?;
        let file = override_dir(&file, path_override);
        self.load_image(&file, true, auto_process)
    }

    /// Write an annotation of the current image and stones in `format`.
    pub fn save_annotation(
        &self,
        path: impl AsRef<Path>,
        format: AnnotationFormat,
    ) -> Result<PathBuf, BoardError> {
        let path = path.as_ref();
        let img = logged(self.image.as_ref().ok_or(BoardError::NoImage))?;
        let image_file = logged(self.image_file.as_deref().ok_or(BoardError::MissingPath))?;

        let results = self.results();
        let record = AnnotationRecord {
            image_file,
            source_file: self.source_file.as_deref(),
            image_size: image_size(img),
            board_size: results.and_then(ResultSet::board_size),
            black: results.map(|r| r.black.as_slice()).unwrap_or_default(),
            white: results.map(|r| r.white.as_slice()).unwrap_or_default(),
        };
        let codec = format.codec(DatasetContext::for_image(image_file));
        logged(
            codec
                .write(&record, path)
                .map_err(|e| BoardError::annotation(path, e)),
        )?;
        log::info!("{format} annotation saved to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Run detection on the current image with the current parameters.
    ///
    /// A missing or generated image yields [`Detection::NotApplicable`].
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn process(&mut self) -> Result<(), BoardError> {
        let img = match &self.image {
            Some(img) if !self.generated => img,
            _ => {
                self.detection = Detection::NotApplicable;
                return Ok(());
            }
        };
        match self.engine.detect(img, &self.params) {
            Ok(mut results) => {
                results.image_size.get_or_insert(image_size(img));
                log::info!(
                    "detected {} black and {} white stones",
                    results.black.len(),
                    results.white.len()
                );
                self.detection = Detection::Processed(results);
                Ok(())
            }
            Err(e) => {
                self.detection = Detection::Unprocessed;
                logged(Err(e.into()))
            }
        }
    }

    /// Draw the board with the selected stone colours.
    pub fn render(
        &self,
        show_black: bool,
        show_white: bool,
        show_boxes: bool,
    ) -> Result<RgbImage, BoardError> {
        let shape = logged(self.board_shape().ok_or(BoardError::NoImage))?;
        let shown = self.results().map(|r| r.filtered(show_black, show_white));
        Ok(self.engine.render(shape, shown.as_ref(), show_boxes))
    }

    /// Stone at image point `(x, y)`, searching black stones first.
    pub fn locate_stone(&self, x: i32, y: i32) -> Option<(StoneColor, Stone)> {
        let results = self.results()?;
        [StoneColor::Black, StoneColor::White]
            .into_iter()
            .find_map(|c| self.engine.locate(x, y, results.stones(c)).map(|s| (c, s)))
    }

    /// Shrink the image so its longer side is at most `max_size`, rescaling
    /// the results to match. Image and results change together or not at all.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn resize(&mut self, max_size: u32) -> Result<(), BoardError> {
        if let Some((img, detection)) = self.shrunk(max_size)? {
            self.image = Some(img);
            self.detection = detection;
        }
        Ok(())
    }

    /// Image and detection state shrunk to `max_size`, or `None` when the
    /// image already fits.
    fn shrunk(&self, max_size: u32) -> Result<Option<(RgbImage, Detection)>, BoardError> {
        let img = logged(self.image.as_ref().ok_or(BoardError::NoImage))?;
        let from = image_size(img);
        let to = logged(fit_within(from, max_size).map_err(BoardError::from))?;
        if to == from {
            return Ok(None);
        }

        let detection = match &self.detection {
            Detection::Processed(r) => Detection::Processed(logged(
                r.rescaled(r.image_size.unwrap_or(from), to)
                    .map_err(BoardError::from),
            )?),
            other => other.clone(),
        };
        let resized = imageops::resize(img, to.width, to.height, FilterType::Triangle);
        log::info!(
            "resized {}x{} -> {}x{}",
            from.width,
            from.height,
            to.width,
            to.height
        );
        Ok(Some((resized, detection)))
    }

    fn default_path(&self, path: Option<&Path>, extension: &str) -> Result<PathBuf, BoardError> {
        match (path, &self.image_file) {
            (Some(p), _) => Ok(p.to_path_buf()),
            (None, Some(img)) => Ok(img.with_extension(extension)),
            (None, None) => Err(BoardError::MissingPath),
        }
    }
}

impl<E: DetectionEngine + Default> Default for Board<E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RenderOnlyEngine;

    #[test]
    fn override_dir_keeps_base_name() {
        assert_eq!(
            override_dir(Path::new("/old/place/board.png"), Some(Path::new("/new"))),
            PathBuf::from("/new/board.png")
        );
        assert_eq!(
            override_dir(Path::new("board.png"), None),
            PathBuf::from("board.png")
        );
    }

    #[test]
    fn generated_board_has_no_results() {
        let mut board = Board::with_generated(RenderOnlyEngine, None);
        assert!(board.is_generated());
        assert_eq!(board.board_shape(), Some(DEFAULT_BOARD_SHAPE));
        board.process().expect("process");
        assert_eq!(board.detection(), &Detection::NotApplicable);
        assert!(board.image_file().is_none());
    }

    #[test]
    fn empty_board_reports_missing_image() {
        let mut board: Board<RenderOnlyEngine> = Board::default();
        assert!(matches!(board.resize(100), Err(BoardError::NoImage)));
        assert!(matches!(board.save(None, None), Err(BoardError::NoImage)));
        assert!(matches!(board.render(true, true, false), Err(BoardError::NoImage)));
        assert!(matches!(board.save_params(None), Err(BoardError::MissingPath)));
        assert!(matches!(board.save_board_info(None), Err(BoardError::NoResults)));
        assert_eq!(board.locate_stone(1, 1), None);
    }
}
