//! Input handling: file type detection and text extraction

pub mod file_detector;
pub mod text_extractor;

pub use file_detector::FileType;
pub use text_extractor::extract_text;
