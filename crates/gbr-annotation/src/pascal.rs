//! Pascal VOC writer.
//!
//! Each stone becomes one `<object>` named `black` or `white` whose bounding
//! box is the stone's disc clipped to the image. `<source>` carries the path
//! of the original photograph so the annotation can be loaded back.

use crate::error::AnnotationError;
use crate::format::{AnnotationCodec, AnnotationFormat, AnnotationRecord, DatasetContext};
use gbr_core::{ImageSize, Stone};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::path::Path;

/// Colour channels recorded in `<size><depth>`.
const IMAGE_DEPTH: u32 = 3;

#[derive(Clone, Debug)]
pub struct PascalVocCodec {
    ctx: DatasetContext,
}

/// Inclusive pixel box in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BndBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
    /// True when the disc extends past the image border.
    pub truncated: bool,
}

impl BndBox {
    /// Box around `stone` clipped to `size`, or `None` if nothing is visible.
    pub fn clipped(stone: &Stone, size: ImageSize) -> Option<Self> {
        if size.is_empty() {
            return None;
        }
        let (w, h) = (
            i32::try_from(size.width).unwrap_or(i32::MAX),
            i32::try_from(size.height).unwrap_or(i32::MAX),
        );
        let r = stone.radius.max(0);
        let raw = [
            stone.x.saturating_sub(r),
            stone.y.saturating_sub(r),
            stone.x.saturating_add(r),
            stone.y.saturating_add(r),
        ];
        if raw[2] < 0 || raw[3] < 0 || raw[0] >= w || raw[1] >= h {
            return None;
        }
        let b = BndBox {
            xmin: raw[0].max(0),
            ymin: raw[1].max(0),
            xmax: raw[2].min(w - 1),
            ymax: raw[3].min(h - 1),
            truncated: false,
        };
        Some(BndBox {
            truncated: [b.xmin, b.ymin, b.xmax, b.ymax] != raw,
            ..b
        })
    }
}

impl PascalVocCodec {
    pub fn new(ctx: DatasetContext) -> Self {
        Self { ctx }
    }

    /// Render the annotation document.
    pub fn to_xml(&self, record: &AnnotationRecord<'_>) -> Result<String, AnnotationError> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        start(&mut w, "annotation")?;

        let file_name = record
            .image_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        text(&mut w, "folder", &self.ctx.folder_name())?;
        text(&mut w, "filename", &file_name)?;
        text(&mut w, "path", &record.image_file.to_string_lossy())?;
        text(&mut w, "source", &record.reference().to_string_lossy())?;

        start(&mut w, "size")?;
        text(&mut w, "width", &record.image_size.width.to_string())?;
        text(&mut w, "height", &record.image_size.height.to_string())?;
        text(&mut w, "depth", &IMAGE_DEPTH.to_string())?;
        end(&mut w, "size")?;
        text(&mut w, "segmented", "0")?;
        if let Some(n) = record.board_size {
            text(&mut w, "board_size", &n.to_string())?;
        }

        for (color, stone) in record.stones() {
            let Some(b) = BndBox::clipped(stone, record.image_size) else {
                log::debug!("{color} stone at ({}, {}) is off the image", stone.x, stone.y);
                continue;
            };
            start(&mut w, "object")?;
            text(&mut w, "name", color.name())?;
            text(&mut w, "pose", "Unspecified")?;
            text(&mut w, "truncated", if b.truncated { "1" } else { "0" })?;
            text(&mut w, "difficult", "0")?;
            start(&mut w, "bndbox")?;
            text(&mut w, "xmin", &b.xmin.to_string())?;
            text(&mut w, "ymin", &b.ymin.to_string())?;
            text(&mut w, "xmax", &b.xmax.to_string())?;
            text(&mut w, "ymax", &b.ymax.to_string())?;
            end(&mut w, "bndbox")?;
            end(&mut w, "object")?;
        }

        end(&mut w, "annotation")?;
        let mut xml = String::from_utf8_lossy(&w.into_inner()).into_owned();
        xml.push('\n');
        Ok(xml)
    }
}

impl AnnotationCodec for PascalVocCodec {
    fn format(&self) -> AnnotationFormat {
        AnnotationFormat::PascalVoc
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn write(&self, record: &AnnotationRecord<'_>, path: &Path) -> Result<(), AnnotationError> {
        let xml = self.to_xml(record)?;
        fs::write(path, xml)?;
        log::debug!(
            "wrote {} objects to {}",
            record.black.len() + record.white.len(),
            path.display()
        );
        Ok(())
    }
}

fn start(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), AnnotationError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), AnnotationError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), AnnotationError> {
    start(w, name)?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    end(w, name)
}
