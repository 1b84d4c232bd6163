//! Skill catalog and keyword matching

use crate::error::{Result, ScreenerError};
use aho_corasick::AhoCorasick;
use std::collections::BTreeSet;
use std::path::Path;

/// Missing-skill lists are capped so the output stays reviewable.
const MAX_MISSING_SKILLS: usize = 25;

/// Immutable set of canonical lower-cased skill strings, loaded once at
/// startup and only ever replaced wholesale by [`SkillCatalog::update_file`].
pub struct SkillCatalog {
    skills: Vec<String>,
    matcher: AhoCorasick,
}

#[derive(Debug, Clone)]
pub struct SkillMatch {
    pub found: BTreeSet<String>,
    /// Sorted catalog entries absent from the text, capped at 25.
    pub missing: Vec<String>,
}

impl SkillCatalog {
    /// Build a catalog from raw entries: lower-cased, deduplicated, sorted.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skills: BTreeSet<String> = entries
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let skills: Vec<String> = skills.into_iter().collect();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&skills)
            .map_err(|e| {
                ScreenerError::Configuration(format!("Failed to build skill matcher: {}", e))
            })?;

        Ok(Self { skills, matcher })
    }

    /// Load the catalog from a flat JSON array of strings; falls back to the
    /// built-in default list when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::from_entries(Self::default_skills());
        }
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<String> = serde_json::from_str(&content)?;
        Self::from_entries(entries)
    }

    /// Offline catalog update: read, union with new entries, dedup, sort,
    /// rewrite the whole file. Serving processes pick the change up on
    /// their next start.
    pub fn update_file<I, S>(path: &Path, new_entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut skills: BTreeSet<String> = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<String>>(&content)?
                .into_iter()
                .collect()
        } else {
            Self::default_skills().iter().map(|s| s.to_string()).collect()
        };

        for entry in new_entries {
            let skill = entry.as_ref().trim().to_lowercase();
            if !skill.is_empty() {
                skills.insert(skill);
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let sorted: Vec<&String> = skills.iter().collect();
        std::fs::write(path, serde_json::to_string_pretty(&sorted)?)?;
        Ok(skills.len())
    }

    /// Case-insensitive substring scan of the text against every catalog
    /// entry. Exact substring containment only, no fuzzy matching.
    pub fn match_text(&self, text: &str) -> SkillMatch {
        let mut found = BTreeSet::new();
        for mat in self.matcher.find_overlapping_iter(text) {
            found.insert(self.skills[mat.pattern()].clone());
        }

        let missing: Vec<String> = self
            .skills
            .iter()
            .filter(|skill| !found.contains(*skill))
            .take(MAX_MISSING_SKILLS)
            .cloned()
            .collect();

        SkillMatch { found, missing }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Built-in catalog used until an external skills file is provisioned.
    fn default_skills() -> &'static [&'static str] {
        &[
            "rust", "python", "javascript", "typescript", "java", "c++", "c#", "go", "ruby",
            "php", "swift", "kotlin", "scala", "sql", "react", "vue", "angular", "svelte",
            "html", "css", "node.js", "express", "django", "flask", "spring", "docker",
            "kubernetes", "aws", "azure", "gcp", "terraform", "ansible", "jenkins", "linux",
            "git", "graphql", "grpc", "rest", "microservices", "postgresql", "mysql",
            "mongodb", "redis", "elasticsearch", "kafka", "spark", "hadoop", "airflow",
            "machine learning", "deep learning", "tensorflow", "pytorch", "pandas", "numpy",
            "nlp", "computer vision", "data analysis", "etl", "agile", "scrum", "jira",
            "project management", "leadership", "communication",
        ]
    }
}
