//! Locating the image an annotation file refers to.

use crate::error::AnnotationError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, PartialEq, Eq)]
enum RefTag {
    Source,
    Path,
}

impl RefTag {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"source" => Some(RefTag::Source),
            b"path" => Some(RefTag::Path),
            _ => None,
        }
    }
}

fn slot<'a>(
    tag: RefTag,
    source: &'a mut Option<String>,
    path: &'a mut Option<String>,
) -> &'a mut Option<String> {
    match tag {
        RefTag::Source => source,
        RefTag::Path => path,
    }
}

fn keep_first(slot: &mut Option<String>, text: &str) {
    let text = text.trim();
    if slot.is_none() && !text.is_empty() {
        *slot = Some(text.to_string());
    }
}

/// Image file named by an annotation document.
///
/// The direct text of the first `<source>` element wins; otherwise the first
/// `<path>`. Whitespace-only text counts as absent.
pub fn image_reference_from_str(xml: &str) -> Result<Option<PathBuf>, AnnotationError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Option<RefTag> = None;
    let mut source: Option<String> = None;
    let mut path: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => open = RefTag::from_name(e.name().as_ref()),
            Event::Text(t) => {
                if let Some(tag) = open {
                    keep_first(slot(tag, &mut source, &mut path), &t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(tag) = open {
                    keep_first(slot(tag, &mut source, &mut path), &String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => open = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(source.or(path).map(PathBuf::from))
}

/// Read an annotation file and return the image it names.
pub fn read_image_reference(path: impl AsRef<Path>) -> Result<PathBuf, AnnotationError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    image_reference_from_str(&xml)?.ok_or_else(|| AnnotationError::MissingFilename {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_preferred_over_path() {
        let xml = "<annotation><path>resized.png</path><source>orig.png</source></annotation>";
        assert_eq!(
            image_reference_from_str(xml).expect("parse"),
            Some(PathBuf::from("orig.png"))
        );
    }

    #[test]
    fn falls_back_to_path_when_source_has_no_text() {
        let xml = "<annotation>\n  <source>\n    <database>Unknown</database>\n  </source>\n  \
                   <path>/data/board.png</path>\n</annotation>";
        assert_eq!(
            image_reference_from_str(xml).expect("parse"),
            Some(PathBuf::from("/data/board.png"))
        );
    }

    #[test]
    fn missing_both_tags_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.xml");
        fs::write(&file, "<annotation><filename>x.png</filename></annotation>").expect("write");
        let err = read_image_reference(&file).unwrap_err();
        assert!(matches!(err, AnnotationError::MissingFilename { .. }));
    }

    #[test]
    fn broken_xml_is_an_error() {
        let err = image_reference_from_str("<annotation><source>x</path>").unwrap_err();
        assert!(matches!(err, AnnotationError::Xml(_)));
    }
}
