// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect produced documents using the `lopdf` crate.

use std::path::Path;

use biodata_core::error::{BiodataError, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument};

/// Page-tree depth after which attribute lookup gives up.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Read-only view of an existing PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            BiodataError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            BiodataError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Number of image XObjects embedded in the file.
    pub fn image_count(&self) -> usize {
        self.document
            .objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }

    /// Size of a page (1-indexed) in millimetres, from its MediaBox.
    pub fn page_size_mm(&self, page_number: u32) -> Result<(f64, f64)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            BiodataError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let media_box = self
            .inherited_attribute(page_id, b"MediaBox")?
            .as_array()
            .map_err(|err| BiodataError::PdfError(format!("malformed MediaBox: {err}")))?;
        let coords = media_box
            .iter()
            .map(|value| self.resolve(value).as_float())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|err| BiodataError::PdfError(format!("malformed MediaBox: {err}")))?;
        let &[x0, y0, x1, y1] = coords.as_slice() else {
            return Err(BiodataError::PdfError(format!(
                "MediaBox has {} entries, expected 4",
                coords.len()
            )));
        };

        let to_mm = |pt: f32| f64::from(pt) * 25.4 / 72.0;
        Ok((to_mm((x1 - x0).abs()), to_mm((y1 - y0).abs())))
    }

    /// Document title from the /Info dictionary, if any.
    pub fn title(&self) -> Option<String> {
        let info = self.resolve(self.document.trailer.get(b"Info").ok()?);
        let title = info.as_dict().ok()?.get(b"Title").ok()?;
        match self.resolve(title) {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    /// Look up `key` on a page, walking up the page tree for inherited values.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Result<&Object> {
        let mut node = page_id;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.document.get_dictionary(node).map_err(|err| {
                BiodataError::PdfError(format!("cannot read page node {:?}: {}", node, err))
            })?;
            if let Ok(value) = dict.get(key) {
                return Ok(self.resolve(value));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = *parent,
                _ => break,
            }
        }
        Err(BiodataError::PdfError(format!(
            "page {:?} has no /{}",
            page_id,
            String::from_utf8_lossy(key)
        )))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }
}

/// PDF text strings are UTF-16BE with a byte-order mark, or PDFDocEncoding,
/// which matches Latin-1 for printable text.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xfe, 0xff, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = PdfReader::from_bytes(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, BiodataError::PdfError(_)));
    }

    #[test]
    fn missing_file_is_a_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfReader::open(dir.path().join("absent.pdf")).err().unwrap();
        assert!(matches!(err, BiodataError::PdfError(_)));
    }

    #[test]
    fn text_strings_decode() {
        assert_eq!(decode_text_string(b"Biodata"), "Biodata");
        assert_eq!(
            decode_text_string(&[0xfe, 0xff, 0x00, 0x42, 0x00, 0x69]),
            "Bi"
        );
    }
}
