//! OPC package access: zip container, content types and relationships.
//!
//! A [`Package`] keeps every part as raw bytes in archive order. Parts the
//! crate never touches are written back byte-for-byte.

mod content_types;
mod relationships;
pub mod xml;

pub use content_types::{ContentTypes, CONTENT_TYPES_PART};
pub use relationships::{
    rels_part_for, resolve_target, Relationship, Relationships, REL_COMMENTS,
    REL_OFFICE_DOCUMENT, REL_PEOPLE, REL_STYLES,
};

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Package-level relationships part.
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// One named part of a package.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part name without leading slash (`word/document.xml`)
    pub name: String,
    /// Raw part bytes
    pub data: Vec<u8>,
}

/// An in-memory zip package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Read a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::PackageCorruption(format!("not a zip archive: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }

        log::debug!("Read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// All parts in archive order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.trim_start_matches('/');
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8 text (a leading BOM is dropped).
    pub fn part_text(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::PackageCorruption(format!("{name} is not UTF-8: {e}")))
    }

    /// Replace a part's bytes, appending the part if it does not exist.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        let name = name.trim_start_matches('/');
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Remove a part, returning its bytes.
    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        let name = name.trim_start_matches('/');
        let index = self.parts.iter().position(|p| p.name == name)?;
        Some(self.parts.remove(index).data)
    }

    /// Parsed `[Content_Types].xml`, or a minimal map if the part is absent.
    pub fn content_types(&self) -> Result<ContentTypes> {
        if self.contains(CONTENT_TYPES_PART) {
            ContentTypes::parse(&self.part_text(CONTENT_TYPES_PART)?)
        } else {
            Ok(ContentTypes::minimal())
        }
    }

    /// Relationships of a source part (empty if it has none).
    pub fn relationships_of(&self, source_part: &str) -> Result<Relationships> {
        let rels_name = if source_part.is_empty() {
            ROOT_RELS_PART.to_string()
        } else {
            rels_part_for(source_part)
        };
        if self.contains(&rels_name) {
            Relationships::parse(&self.part_text(&rels_name)?)
        } else {
            Ok(Relationships::new())
        }
    }

    /// Store the relationships of a source part.
    pub fn set_relationships(&mut self, source_part: &str, rels: &Relationships) -> Result<()> {
        let rels_name = rels_part_for(source_part);
        self.set_part(&rels_name, rels.to_xml_bytes()?);
        Ok(())
    }

    /// Name of the main document part, found through the package relationships.
    pub fn main_document_part(&self) -> Option<String> {
        let from_rels = self
            .relationships_of("")
            .ok()
            .and_then(|rels| rels.by_type(REL_OFFICE_DOCUMENT).map(|r| resolve_target("", &r.target)));
        match from_rels {
            Some(name) if self.contains(&name) => Some(name),
            _ if self.contains("word/document.xml") => Some("word/document.xml".to_string()),
            _ => None,
        }
    }

    /// Write the package as a deflate-compressed zip.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // Content types first, as Word expects.
        let ordered = self
            .parts
            .iter()
            .filter(|p| p.name == CONTENT_TYPES_PART)
            .chain(self.parts.iter().filter(|p| p.name != CONTENT_TYPES_PART));
        for part in ordered {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        Ok(zip.finish()?)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Package {
        let mut pkg = Package::new();
        pkg.set_part(
            CONTENT_TYPES_PART,
            br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_vec(),
        );
        pkg.set_part(
            ROOT_RELS_PART,
            format!(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="word/document.xml"/></Relationships>"#
            )
            .into_bytes(),
        );
        pkg.set_part("word/document.xml", b"<w:document/>".to_vec());
        pkg.set_part("word/media/image1.png", vec![0x89, 0x50, 0x4E, 0x47, 0, 1, 2]);
        pkg
    }

    #[test]
    fn test_zip_round_trip_keeps_parts() {
        let pkg = sample();
        let bytes = pkg.to_bytes().unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let again = Package::from_bytes(&bytes).unwrap();
        assert_eq!(again.parts().len(), 4);
        assert_eq!(again.parts()[0].name, CONTENT_TYPES_PART);
        assert_eq!(
            again.part("word/media/image1.png").unwrap(),
            pkg.part("word/media/image1.png").unwrap()
        );
    }

    #[test]
    fn test_main_document_part() {
        assert_eq!(sample().main_document_part().as_deref(), Some("word/document.xml"));
        assert_eq!(Package::new().main_document_part(), None);
    }

    #[test]
    fn test_set_and_remove() {
        let mut pkg = sample();
        pkg.set_part("/word/document.xml", b"<x/>".to_vec());
        assert_eq!(pkg.part_text("word/document.xml").unwrap(), "<x/>");
        assert!(pkg.remove_part("word/document.xml").is_some());
        assert!(matches!(
            pkg.part_text("word/document.xml"),
            Err(Error::MissingPart(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Package::from_bytes(b"plain text"),
            Err(Error::PackageCorruption(_))
        ));
    }

    #[test]
    fn test_relationships_of_missing_is_empty() {
        let pkg = sample();
        let rels = pkg.relationships_of("word/document.xml").unwrap();
        assert!(rels.entries().is_empty());
    }
}
