//! Resume parsing: extraction, normalization, and feature bundling

use crate::error::Result;
use crate::input::extract_text;
use crate::processing::features::{
    extract_certifications, extract_contact_info, extract_education, extract_experience_years,
    extract_last_role, extract_summary,
};
use crate::processing::skills::SkillCatalog;
use crate::processing::text_processor::TextProcessor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured candidate profile produced from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedResume {
    pub raw_text: String,
    pub clean_text: String,
    pub skills: BTreeSet<String>,
    /// Catalog entries absent from the text, sorted, capped at 25. The
    /// scorer's deduplicated copy is the canonical one for persistence.
    pub missing_skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub last_role: Option<String>,
}

pub struct ResumeParser {
    processor: TextProcessor,
    catalog: SkillCatalog,
}

impl ResumeParser {
    pub fn new(catalog: SkillCatalog) -> Self {
        Self {
            processor: TextProcessor::new(),
            catalog,
        }
    }

    /// Parse raw document bytes into a structured profile. Fails only on
    /// structurally invalid input (unsupported or corrupt documents).
    pub fn parse(&self, file_bytes: &[u8], filename: &str) -> Result<ParsedResume> {
        let raw_text = extract_text(file_bytes, filename)?;
        Ok(self.parse_text(raw_text))
    }

    /// Parse already-extracted text; used by the bytes path above and by
    /// callers that hold plain text.
    pub fn parse_text(&self, raw_text: String) -> ParsedResume {
        let normalized = self.processor.process(&raw_text);

        let skill_match = self.catalog.match_text(&normalized.clean_text);
        let experience_years = extract_experience_years(&normalized.clean_text);
        let education = extract_education(&normalized.sentences);
        let certifications = extract_certifications(&normalized.clean_text);
        let contact = extract_contact_info(&normalized.clean_text);
        let summary = extract_summary(&normalized.sentences);
        let last_role = extract_last_role(&normalized.sentences);

        ParsedResume {
            raw_text,
            clean_text: normalized.clean_text,
            skills: skill_match.found,
            missing_skills: skill_match.missing,
            experience_years,
            education,
            certifications,
            email: contact.email,
            phone: contact.phone,
            summary,
            last_role,
        }
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }
}
