//! File type detection

use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum FileType {
    Pdf,
    Docx,
    Unknown(String),
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            // python-docx also only truly reads OOXML, so .doc goes the
            // same route and a genuine OLE binary fails as corrupt.
            "docx" | "doc" => FileType::Docx,
            other => FileType::Unknown(format!(".{}", other)),
        }
    }

    pub fn from_filename(filename: &str) -> Self {
        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => FileType::Unknown("(no extension)".to_string()),
        }
    }
}
