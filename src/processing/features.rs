//! Heuristic feature extractors
//!
//! Pure functions over normalized text. Absence of a feature is `None` or
//! an empty collection, never an error.

use regex::Regex;
use std::sync::LazyLock;

static EXPERIENCE_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s+\+?\s*(?:years?|yrs?)").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}").unwrap()
});

const EDUCATION_KEYWORDS: [&str; 8] = [
    "bachelor", "master", "phd", "university", "college", "certificate", "diploma", "degree",
];

const CERTIFICATION_KEYWORDS: [&str; 5] =
    ["certified", "certification", "certificate", "professional", "license"];

const ROLE_KEYWORDS: [&str; 7] = [
    "engineer", "developer", "manager", "consultant", "analyst", "specialist", "architect",
];

const MAX_EDUCATION: usize = 5;
const MAX_CERTIFICATIONS: usize = 10;
const SUMMARY_SENTENCES: usize = 3;

/// Largest stated years-of-experience figure in the text; multiple claims
/// resolve to the maximum.
pub fn extract_experience_years(text: &str) -> Option<f64> {
    EXPERIENCE_YEARS
        .captures_iter(text)
        .filter_map(|cap| cap[1].parse::<f64>().ok())
        .fold(None, |best, years| match best {
            Some(current) if current >= years => Some(current),
            _ => Some(years),
        })
}

/// Sentences mentioning an education keyword, order-preserving, first 5.
pub fn extract_education(sentences: &[String]) -> Vec<String> {
    sentences
        .iter()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            EDUCATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .take(MAX_EDUCATION)
        .cloned()
        .collect()
}

/// Lines (text split on '.') mentioning a certification keyword, first 10.
pub fn extract_certifications(text: &str) -> Vec<String> {
    text.split('.')
        .filter_map(|line| {
            let lower = line.to_lowercase();
            if CERTIFICATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                let trimmed = line.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            } else {
                None
            }
        })
        .take(MAX_CERTIFICATIONS)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// First email address and first loose phone number in the text.
pub fn extract_contact_info(text: &str) -> ContactInfo {
    ContactInfo {
        email: EMAIL.find(text).map(|m| m.as_str().to_string()),
        phone: PHONE.find(text).map(|m| m.as_str().to_string()),
    }
}

/// First sentence containing a role-title keyword.
pub fn extract_last_role(sentences: &[String]) -> Option<String> {
    sentences
        .iter()
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            ROLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .cloned()
}

/// First three sentences joined, or `None` when the text has no sentences.
pub fn extract_summary(sentences: &[String]) -> Option<String> {
    if sentences.is_empty() {
        return None;
    }
    Some(
        sentences
            .iter()
            .take(SUMMARY_SENTENCES)
            .cloned()
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_experience_takes_maximum() {
        let years =
            extract_experience_years("5 years of experience and 7.5 yrs in prior role");
        assert_eq!(years, Some(7.5));
    }

    #[test]
    fn test_experience_plus_suffix_and_case() {
        assert_eq!(extract_experience_years("10 + Years leading teams"), Some(10.0));
        assert_eq!(extract_experience_years("3 YRS as contractor"), Some(3.0));
    }

    #[test]
    fn test_experience_absent() {
        assert_eq!(extract_experience_years("seasoned professional"), None);
    }

    #[test]
    fn test_education_cap_and_order() {
        let input = sentences(&[
            "Bachelor of Science.",
            "Worked at Acme.",
            "Master of Engineering.",
            "PhD candidate.",
            "Attended Springfield University.",
            "Community college coursework.",
            "Second degree in progress.",
        ]);
        let education = extract_education(&input);
        assert_eq!(education.len(), 5);
        assert_eq!(education[0], "Bachelor of Science.");
        assert!(!education.contains(&"Worked at Acme.".to_string()));
    }

    #[test]
    fn test_certifications_cap_and_trim() {
        let text = " AWS Certified Solutions Architect. Scrum certification earned.  plain line . Professional license held";
        let certs = extract_certifications(text);
        assert_eq!(
            certs,
            vec![
                "AWS Certified Solutions Architect",
                "Scrum certification earned",
                "Professional license held"
            ]
        );
    }

    #[test]
    fn test_contact_info() {
        let contact =
            extract_contact_info("Reach me at jane.doe@example.com or +1 555-123-4567.");
        assert_eq!(contact.email.as_deref(), Some("jane.doe@example.com"));
        assert!(contact.phone.as_deref().unwrap().contains("555"));
    }

    #[test]
    fn test_contact_info_absent() {
        let contact = extract_contact_info("no contact details here");
        assert_eq!(contact, ContactInfo::default());
    }

    #[test]
    fn test_last_role_first_match() {
        let input = sentences(&[
            "Passionate about systems.",
            "Senior Software Engineer at Acme.",
            "Previously engineering manager.",
        ]);
        assert_eq!(
            extract_last_role(&input).as_deref(),
            Some("Senior Software Engineer at Acme.")
        );
    }

    #[test]
    fn test_summary_takes_first_three() {
        let input = sentences(&["One.", "Two.", "Three.", "Four."]);
        assert_eq!(extract_summary(&input).as_deref(), Some("One. Two. Three."));
        assert_eq!(extract_summary(&[]), None);
    }
}
