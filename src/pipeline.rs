//! Screening pipeline: document bytes in, merged scored record out
//!
//! Composes the parser, similarity engine, classifier, and composite scorer.
//! The caller persists the resulting record; nothing is stored here.

use crate::error::Result;
use crate::ml::engine::NlpEngine;
use crate::processing::parser::{ParsedResume, ResumeParser};
use crate::processing::scorer::{calculate_scores, FitCategory, ScoreComponent, ScoringResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One scoring request as received from the caller.
#[derive(Debug, Clone)]
pub struct ScreeningRequest {
    pub file_bytes: Vec<u8>,
    pub filename: String,
    pub job_description: Option<String>,
    pub candidate_name: Option<String>,
}

/// Merged parse + scoring output handed to the persistence collaborator.
/// `missing_skills` is the scorer's deduplicated sorted list; the parser's
/// raw catalog diff is only an intermediate input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub candidate_name: Option<String>,
    pub filename: String,

    pub raw_text: String,
    pub clean_text: String,
    pub skills: BTreeSet<String>,
    pub missing_skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub last_role: Option<String>,

    pub skill_match_score: f64,
    pub experience_score: f64,
    pub similarity_score: f64,
    pub total_ai_score: f64,
    pub category: FitCategory,
    pub breakdown: Vec<ScoreComponent>,

    pub predicted_category: Option<String>,
    pub category_confidence: Option<f64>,
}

impl ScreeningRecord {
    fn merge(
        candidate_name: Option<String>,
        filename: String,
        resume: ParsedResume,
        scores: ScoringResult,
        predicted_category: Option<String>,
        category_confidence: Option<f64>,
    ) -> Self {
        Self {
            candidate_name,
            filename,
            raw_text: resume.raw_text,
            clean_text: resume.clean_text,
            skills: resume.skills,
            missing_skills: scores.missing_skills,
            experience_years: resume.experience_years,
            education: resume.education,
            certifications: resume.certifications,
            email: resume.email,
            phone: resume.phone,
            summary: resume.summary,
            last_role: resume.last_role,
            skill_match_score: scores.skill_match_score,
            experience_score: scores.experience_score,
            similarity_score: scores.similarity_score,
            total_ai_score: scores.total_ai_score,
            category: scores.category,
            breakdown: scores.breakdown,
            predicted_category,
            category_confidence,
        }
    }
}

pub struct ScreeningPipeline {
    parser: ResumeParser,
    engine: Arc<NlpEngine>,
}

impl ScreeningPipeline {
    pub fn new(parser: ResumeParser, engine: Arc<NlpEngine>) -> Self {
        Self { parser, engine }
    }

    pub fn engine(&self) -> &Arc<NlpEngine> {
        &self.engine
    }

    /// Run one request through the full pipeline. Structurally invalid
    /// documents are rejected; a missing classifier only leaves the
    /// category fields unset.
    pub async fn screen(&self, request: ScreeningRequest) -> Result<ScreeningRecord> {
        debug!("Screening {}", request.filename);
        let resume = self.parser.parse(&request.file_bytes, &request.filename)?;

        let similarity = self
            .engine
            .similarity(&resume.clean_text, request.job_description.as_deref())
            .await?;

        let prediction = self.engine.predict_category(&resume.clean_text).await?;

        let scores = calculate_scores(
            &resume.skills,
            &resume.missing_skills,
            resume.experience_years,
            similarity,
        );

        info!(
            "Scored {}: total {} ({})",
            request.filename, scores.total_ai_score, scores.category
        );

        let (predicted_category, category_confidence) = match prediction {
            Some(p) => (Some(p.predicted_category), Some(p.confidence)),
            None => (None, None),
        };

        Ok(ScreeningRecord::merge(
            request.candidate_name,
            request.filename,
            resume,
            scores,
            predicted_category,
            category_confidence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ml::embeddings::test_support::StubEmbedder;
    use crate::processing::skills::SkillCatalog;
    use tempfile::TempDir;

    fn pipeline(models_dir: &TempDir) -> ScreeningPipeline {
        let mut config = Config::default();
        config.models.models_dir = models_dir.path().to_path_buf();

        let catalog = SkillCatalog::from_entries(["python", "rust", "docker"]).unwrap();
        let engine = Arc::new(NlpEngine::with_embedder(config, Arc::new(StubEmbedder)));
        ScreeningPipeline::new(ResumeParser::new(catalog), engine)
    }

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        use std::io::Write;
        use zip::write::FileOptions;

        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let document = format!("<w:document><w:body>{}</w:body></w:document>", body);

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut archive = zip::ZipWriter::new(&mut cursor);
            archive
                .start_file("word/document.xml", FileOptions::default())
                .unwrap();
            archive.write_all(document.as_bytes()).unwrap();
            archive.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[tokio::test]
    async fn test_screen_without_job_description() {
        let dir = TempDir::new().unwrap();
        let request = ScreeningRequest {
            file_bytes: docx_bytes(&[
                "Jane Doe, Software Engineer.",
                "rust and python services, 6 years of experience.",
            ]),
            filename: "jane.docx".to_string(),
            job_description: None,
            candidate_name: Some("Jane Doe".to_string()),
        };

        let record = pipeline(&dir).screen(request).await.unwrap();

        assert_eq!(record.similarity_score, 50.0);
        assert!(record.skills.contains("rust"));
        assert!(record.skills.contains("python"));
        assert_eq!(record.missing_skills, vec!["docker"]);
        assert_eq!(record.experience_years, Some(6.0));
        assert!(record.last_role.as_deref().unwrap().contains("Engineer"));
        // No classifier loaded: category degrades to unset, request succeeds
        assert_eq!(record.predicted_category, None);
        assert_eq!(record.category_confidence, None);
    }

    #[tokio::test]
    async fn test_screen_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let request = ScreeningRequest {
            file_bytes: docx_bytes(&["rust engineer, 3 years"]),
            filename: "r.docx".to_string(),
            job_description: Some("rust engineer".to_string()),
            candidate_name: None,
        };

        let a = pipeline.screen(request.clone()).await.unwrap();
        let b = pipeline.screen(request).await.unwrap();
        assert_eq!(a.total_ai_score, b.total_ai_score);
        assert_eq!(a.breakdown, b.breakdown);
    }

    #[tokio::test]
    async fn test_screen_rejects_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let request = ScreeningRequest {
            file_bytes: b"plain".to_vec(),
            filename: "resume.txt".to_string(),
            job_description: None,
            candidate_name: None,
        };

        let err = pipeline(&dir).screen(request).await.unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[tokio::test]
    async fn test_weak_fit_resume() {
        let dir = TempDir::new().unwrap();
        let request = ScreeningRequest {
            file_bytes: docx_bytes(&["No relevant background."]),
            filename: "empty.docx".to_string(),
            job_description: None,
            candidate_name: None,
        };

        let record = pipeline(&dir).screen(request).await.unwrap();
        // similarity 50, skills 0/3, experience unknown: 30 + 0 + 4 = 34
        assert_eq!(record.total_ai_score, 34.0);
        assert_eq!(record.category, FitCategory::WeakFit);
    }

    #[tokio::test]
    async fn test_record_serializes_with_canonical_missing_skills() {
        let dir = TempDir::new().unwrap();
        let request = ScreeningRequest {
            file_bytes: docx_bytes(&["python only here"]),
            filename: "p.docx".to_string(),
            job_description: None,
            candidate_name: None,
        };

        let record = pipeline(&dir).screen(request).await.unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["missing_skills"], serde_json::json!(["docker", "rust"]));
        assert_eq!(json["category"], serde_json::json!("Weak Fit"));
    }
}
