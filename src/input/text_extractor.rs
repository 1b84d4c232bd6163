//! Text extraction from resume documents

use crate::error::{Result, ScreenerError};
use crate::input::file_detector::FileType;
use regex::Regex;
use std::io::Read;
use std::sync::LazyLock;

static XML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ScreenerError::Extraction(format!("Failed to extract text from PDF: {}", e)))
    }
}

/// Reads `word/document.xml` out of the OOXML container and flattens it to
/// plain text, one line per paragraph.
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor)
            .map_err(|e| ScreenerError::Extraction(format!("Not a valid DOCX archive: {}", e)))?;

        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|e| ScreenerError::Extraction(format!("DOCX missing document body: {}", e)))?;

        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| ScreenerError::Extraction(format!("Failed to read DOCX body: {}", e)))?;

        Ok(Self::xml_to_text(&xml))
    }
}

impl DocxExtractor {
    fn xml_to_text(xml: &str) -> String {
        // Paragraph ends become newlines before tags are stripped
        let text = xml.replace("</w:p>", "\n").replace("<w:tab/>", "\t");

        let clean_text = XML_TAG.replace_all(&text, "");

        let decoded = clean_text
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'");

        let lines: Vec<String> = decoded
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        lines.join("\n")
    }
}

/// Extract plain text from document bytes, dispatching on the filename
/// extension. Pure transformation, no side effects.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    match FileType::from_filename(filename) {
        FileType::Pdf => PdfExtractor.extract(bytes),
        FileType::Docx => DocxExtractor.extract(bytes),
        FileType::Unknown(ext) => Err(ScreenerError::UnsupportedFormat(ext)),
    }
}
