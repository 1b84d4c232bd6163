//! Composite fit scoring
//!
//! Pure, deterministic combination of the similarity, skill-match, and
//! experience signals. Trusts upstream extraction; never touches models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SIMILARITY_WEIGHT: f64 = 0.6;
pub const SKILL_MATCH_WEIGHT: f64 = 0.3;
pub const EXPERIENCE_WEIGHT: f64 = 0.1;

/// No skill information at all reads as neutral.
const NEUTRAL_SKILL_SCORE: f64 = 50.0;
/// Unknown experience scores below neutral but above zero.
const UNKNOWN_EXPERIENCE_SCORE: f64 = 40.0;
const EXPERIENCE_CAP_YEARS: f64 = 20.0;

const STRONG_FIT_THRESHOLD: f64 = 80.0;
const WEAK_FIT_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitCategory {
    #[serde(rename = "Strong Fit")]
    StrongFit,
    #[serde(rename = "Medium Fit")]
    MediumFit,
    #[serde(rename = "Weak Fit")]
    WeakFit,
}

impl std::fmt::Display for FitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FitCategory::StrongFit => "Strong Fit",
            FitCategory::MediumFit => "Medium Fit",
            FitCategory::WeakFit => "Weak Fit",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub metric: String,
    pub weight: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub skill_match_score: f64,
    pub experience_score: f64,
    pub similarity_score: f64,
    pub total_ai_score: f64,
    pub category: FitCategory,
    /// Deduplicated, sorted copy of the caller-supplied missing skills;
    /// canonical for persistence.
    pub missing_skills: Vec<String>,
    pub breakdown: Vec<ScoreComponent>,
}

fn clamp(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    rounded.clamp(0.0, 100.0)
}

fn skill_match_score(found: usize, missing: usize) -> f64 {
    let total = found + missing;
    if total == 0 {
        return NEUTRAL_SKILL_SCORE;
    }
    (found as f64 / total as f64) * 100.0
}

fn experience_score(experience_years: Option<f64>) -> f64 {
    match experience_years {
        None => UNKNOWN_EXPERIENCE_SCORE,
        Some(years) => (years.min(EXPERIENCE_CAP_YEARS) / EXPERIENCE_CAP_YEARS) * 100.0,
    }
}

fn categorize(score: f64) -> FitCategory {
    if score > STRONG_FIT_THRESHOLD {
        FitCategory::StrongFit
    } else if score >= WEAK_FIT_THRESHOLD {
        FitCategory::MediumFit
    } else {
        FitCategory::WeakFit
    }
}

/// Combine the extracted signals into the final fit score and category.
pub fn calculate_scores(
    found_skills: &BTreeSet<String>,
    missing_skills: &[String],
    experience_years: Option<f64>,
    similarity_score: f64,
) -> ScoringResult {
    let skill_match_score = clamp(skill_match_score(found_skills.len(), missing_skills.len()));
    let experience_score = clamp(experience_score(experience_years));
    let similarity_score = clamp(similarity_score);

    let total_ai_score = clamp(
        similarity_score * SIMILARITY_WEIGHT
            + skill_match_score * SKILL_MATCH_WEIGHT
            + experience_score * EXPERIENCE_WEIGHT,
    );

    let breakdown = vec![
        ScoreComponent {
            metric: "similarity".to_string(),
            weight: SIMILARITY_WEIGHT,
            score: similarity_score,
        },
        ScoreComponent {
            metric: "skill_match".to_string(),
            weight: SKILL_MATCH_WEIGHT,
            score: skill_match_score,
        },
        ScoreComponent {
            metric: "experience".to_string(),
            weight: EXPERIENCE_WEIGHT,
            score: experience_score,
        },
    ];

    let missing: BTreeSet<String> = missing_skills.iter().cloned().collect();

    ScoringResult {
        skill_match_score,
        experience_score,
        similarity_score,
        total_ai_score,
        category: categorize(total_ai_score),
        missing_skills: missing.into_iter().collect(),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(skills: &[&str]) -> BTreeSet<String> {
        skills.iter().map(|s| s.to_string()).collect()
    }

    fn missing(skills: &[&str]) -> Vec<String> {
        skills.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_scores_within_bounds() {
        let result = calculate_scores(&found(&["python"]), &missing(&["react"]), Some(50.0), 250.0);
        for score in [
            result.skill_match_score,
            result.experience_score,
            result.similarity_score,
            result.total_ai_score,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_category_boundaries_are_strict() {
        assert_eq!(categorize(80.00), FitCategory::MediumFit);
        assert_eq!(categorize(80.01), FitCategory::StrongFit);
        assert_eq!(categorize(60.00), FitCategory::MediumFit);
        assert_eq!(categorize(59.99), FitCategory::WeakFit);
    }

    #[test]
    fn test_skill_match_ratio() {
        let result =
            calculate_scores(&found(&["python", "react"]), &missing(&["docker"]), None, 50.0);
        assert_eq!(result.skill_match_score, 66.67);
    }

    #[test]
    fn test_neutral_defaults() {
        let result = calculate_scores(&found(&[]), &[], None, 50.0);
        assert_eq!(result.skill_match_score, 50.0);
        assert_eq!(result.experience_score, 40.0);
    }

    #[test]
    fn test_experience_is_capped_at_twenty_years() {
        let result = calculate_scores(&found(&[]), &[], Some(35.0), 50.0);
        assert_eq!(result.experience_score, 100.0);
    }

    #[test]
    fn test_breakdown_order_and_weights() {
        let result = calculate_scores(&found(&["python"]), &[], Some(10.0), 80.0);
        let metrics: Vec<&str> = result.breakdown.iter().map(|c| c.metric.as_str()).collect();
        assert_eq!(metrics, vec!["similarity", "skill_match", "experience"]);
        let weights: Vec<f64> = result.breakdown.iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![0.6, 0.3, 0.1]);
    }

    #[test]
    fn test_missing_skills_deduplicated_and_sorted() {
        let result = calculate_scores(
            &found(&[]),
            &missing(&["react", "docker", "react", "aws"]),
            None,
            50.0,
        );
        assert_eq!(result.missing_skills, vec!["aws", "docker", "react"]);
    }

    #[test]
    fn test_weighted_total_medium_fit() {
        // 0.6*90 + 0.3*66.67 + 0.1*50 = 79.0
        let result = calculate_scores(
            &found(&["python", "react"]),
            &missing(&["docker"]),
            Some(10.0),
            90.0,
        );
        assert_eq!(result.skill_match_score, 66.67);
        assert_eq!(result.experience_score, 50.0);
        assert_eq!(result.total_ai_score, 79.0);
        assert_eq!(result.category, FitCategory::MediumFit);
    }

    #[test]
    fn test_weighted_total_strong_fit() {
        // 0.6*90 + 0.3*66.67 + 0.1*100 = 84.0
        let result = calculate_scores(
            &found(&["python", "react"]),
            &missing(&["docker"]),
            Some(20.0),
            90.0,
        );
        assert_eq!(result.total_ai_score, 84.0);
        assert_eq!(result.category, FitCategory::StrongFit);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let a = calculate_scores(&found(&["python"]), &missing(&["react"]), Some(4.5), 72.33);
        let b = calculate_scores(&found(&["python"]), &missing(&["react"]), Some(4.5), 72.33);
        assert_eq!(a, b);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(FitCategory::StrongFit.to_string(), "Strong Fit");
        assert_eq!(FitCategory::WeakFit.to_string(), "Weak Fit");
    }
}
