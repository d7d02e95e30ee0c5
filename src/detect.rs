//! Early rejection of files that are not PDFs.
//!
//! Readers accept a `%PDF-x.y` header anywhere in the first kilobyte, so
//! leading garbage (mail headers, BOMs) does not make a document unreadable.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const HEADER: &[u8] = b"%PDF-";

/// How far into the file the header may start.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Header version of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// `major.minor`, e.g. "1.4"
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Sniff the header of a file on disk.
///
/// Open and read failures are reported as [`Error::DocumentUnreadable`] naming the path.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let path = path.as_ref();
    let unreadable =
        |message: String| Error::DocumentUnreadable(format!("{}: {}", path.display(), message));

    let mut prefix = Vec::with_capacity(HEADER_SEARCH_WINDOW + 8);
    File::open(path)
        .and_then(|file| file.take((HEADER_SEARCH_WINDOW + 8) as u64).read_to_end(&mut prefix))
        .map_err(|e| unreadable(e.to_string()))?;

    sniff(&prefix).map_err(unreadable)
}

/// Sniff the header of an in-memory document.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    sniff(data).map_err(Error::DocumentUnreadable)
}

fn sniff(data: &[u8]) -> std::result::Result<PdfFormat, String> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW + HEADER.len())];
    let start = window
        .windows(HEADER.len())
        .position(|w| w == HEADER)
        .ok_or_else(|| "not a PDF: no %PDF- header".to_string())?;

    match data.get(start + HEADER.len()..start + HEADER.len() + 3) {
        Some([major, b'.', minor]) if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(PdfFormat {
                version: format!("{}.{}", *major as char, *minor as char),
            })
        }
        Some(other) => Err(format!(
            "unsupported PDF version: {}",
            String::from_utf8_lossy(other)
        )),
        None => Err("not a PDF: truncated header".to_string()),
    }
}

/// Whether the file at `path` starts like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}
