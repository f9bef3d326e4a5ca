//! DOCX document parser using zip + quick-xml.

use std::io::Read;
use std::path::Path;

use crate::annotate::CommentsPart;
use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{Block, Document, Metadata, StyleSheet};
use crate::package::xml::Element;
use crate::package::{resolve_target, Package, REL_STYLES};

use super::options::ParseOptions;

const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// DOCX document parser.
pub struct DocxParser {
    package: Package,
    options: ParseOptions,
}

impl DocxParser {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a DOCX file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a zip before reading the directory
        detect_format_from_path(path)?;

        let package = Package::open(path)?;
        Ok(Self { package, options })
    }

    /// Parse a DOCX from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a DOCX from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(&data[..data.len().min(4)])?;
        let package = Package::from_bytes(data)?;
        Ok(Self { package, options })
    }

    /// Parse a DOCX from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a DOCX from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Use an already opened package.
    pub fn from_package(package: Package, options: ParseOptions) -> Self {
        Self { package, options }
    }

    /// The package being parsed.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Parse the package into a document model.
    pub fn parse(&self) -> Result<Document> {
        let main_part = self
            .package
            .main_document_part()
            .ok_or_else(|| Error::PackageCorruption("no main document part".to_string()))?;

        let text = self
            .package
            .part_text(&main_part)
            .map_err(|e| Error::PackageCorruption(format!("{main_part}: {e}")))?;
        let mut root = Element::parse(&text)
            .map_err(|e| Error::PackageCorruption(format!("{main_part}: {e}")))?;

        let body = root
            .child_mut("w:body")
            .ok_or_else(|| Error::PackageCorruption(format!("{main_part} has no w:body")))?;
        let blocks: Vec<Block> = std::mem::take(&mut body.children)
            .into_iter()
            .map(Block::from_node)
            .collect();

        let styles = self.parse_styles(&main_part)?;
        let comments = CommentsPart::load(&self.package, &main_part)?;
        let metadata = self.parse_metadata()?;

        log::debug!(
            "Parsed {}: {} blocks, {} styles, {} comments",
            main_part,
            blocks.len(),
            styles.len(),
            comments.len()
        );

        Ok(Document::from_parts(
            self.package.clone(),
            main_part,
            root,
            blocks,
            styles,
            comments,
            metadata,
        ))
    }

    fn parse_styles(&self, main_part: &str) -> Result<StyleSheet> {
        let styles_part = self
            .package
            .relationships_of(main_part)?
            .by_type(REL_STYLES)
            .map(|r| resolve_target(main_part, &r.target))
            .unwrap_or_else(|| "word/styles.xml".to_string());

        if !self.package.contains(&styles_part) {
            log::debug!("No styles part; using an empty stylesheet");
            return Ok(StyleSheet::new());
        }

        let parsed = self
            .package
            .part_text(&styles_part)
            .and_then(|text| Element::parse(&text));
        match parsed {
            Ok(root) => Ok(StyleSheet::from_element(&root)),
            Err(e) if self.options.is_lenient() => {
                log::warn!("Ignoring malformed styles part {}: {}", styles_part, e);
                Ok(StyleSheet::new())
            }
            Err(e) => Err(Error::PackageCorruption(format!("{styles_part}: {e}"))),
        }
    }

    fn parse_metadata(&self) -> Result<Metadata> {
        if !self.options.load_metadata || !self.package.contains(CORE_PROPERTIES_PART) {
            return Ok(Metadata::default());
        }

        let parsed = self
            .package
            .part_text(CORE_PROPERTIES_PART)
            .and_then(|text| Element::parse(&text));
        match parsed {
            Ok(root) => Ok(Metadata::from_core_properties(&root)),
            Err(e) if self.options.is_lenient() => {
                log::warn!("Ignoring malformed core properties: {}", e);
                Ok(Metadata::default())
            }
            Err(e) => Err(Error::PackageCorruption(format!("{CORE_PROPERTIES_PART}: {e}"))),
        }
    }
}
