//! DOCX format detection and validation.

use crate::error::{Error, Result};
use crate::package::Package;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Container format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Whether the zip directory was inspected (full data was available)
    pub verified: bool,
    /// Main document part, when verified
    pub main_part: Option<String>,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.main_part {
            Some(part) => write!(f, "DOCX ({part})"),
            None => write!(f, "ZIP container"),
        }
    }
}

/// Zip local file header magic.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect the format from a file path.
///
/// Only the header is read; use [`is_docx`] to also verify the zip contents.
///
/// # Example
/// ```no_run
/// use paperlint::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("paper.docx").unwrap();
/// println!("{format}");
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .map_err(|_| Error::UnknownFormat)?;
    detect_format_from_bytes(&header)
}

/// Detect the format from bytes.
///
/// With only a header this checks the zip magic. When `data` holds a whole
/// archive the main document part is looked up as well.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !data.starts_with(ZIP_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    match Package::from_bytes(data) {
        Ok(package) => match package.main_document_part() {
            Some(main_part) => Ok(DocxFormat {
                verified: true,
                main_part: Some(main_part),
            }),
            None => Err(Error::UnknownFormat),
        },
        // A truncated header cannot be opened; it still looks like a zip.
        Err(_) => Ok(DocxFormat {
            verified: false,
            main_part: None,
        }),
    }
}

/// Check if a file is a WordprocessingML package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    std::fs::read(path)
        .map(|data| is_docx_bytes(&data))
        .unwrap_or(false)
}

/// Check if bytes hold a complete WordprocessingML package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(f) if f.verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;

    fn docx_bytes() -> Vec<u8> {
        let mut pkg = Package::new();
        pkg.set_part("word/document.xml", b"<w:document/>".to_vec());
        pkg.to_bytes().unwrap()
    }

    #[test]
    fn test_detect_docx() {
        let format = detect_format_from_bytes(&docx_bytes()).unwrap();
        assert!(format.verified);
        assert_eq!(format.main_part.as_deref(), Some("word/document.xml"));
    }

    #[test]
    fn test_detect_header_only() {
        let format = detect_format_from_bytes(b"PK\x03\x04").unwrap();
        assert!(!format.verified);
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"%PDF-1.7");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut pkg = Package::new();
        pkg.set_part("readme.txt", b"hi".to_vec());
        let bytes = pkg.to_bytes().unwrap();
        assert!(matches!(
            detect_format_from_bytes(&bytes),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_is_docx_bytes() {
        assert!(is_docx_bytes(&docx_bytes()));
        assert!(!is_docx_bytes(b"Not a docx"));
        assert!(!is_docx_bytes(b"PK\x03\x04"));
    }
}
