//! Embeddings generation using Model2Vec

use crate::error::{Result, ScreenerError};
use log::info;
use model2vec_rs::model::StaticModel;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

/// Similarity reported when there is no job description to compare against.
/// A mid-point avoids biasing the composite score either way.
pub const NEUTRAL_SIMILARITY: f64 = 50.0;

/// Seam over the embedding model so the classifier and similarity paths can
/// be exercised with a deterministic stub in tests.
pub trait Embedder: Send + Sync {
    fn encode(&self, texts: &[String]) -> Vec<Vec<f32>>;

    fn encode_single(&self, text: &str) -> Vec<f32>;
}

pub struct EmbeddingEngine {
    model: StaticModel,
    model_name: String,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl EmbeddingEngine {
    /// Load a Model2Vec model from a local folder or HuggingFace repo id.
    pub fn new(model_path: &Path, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None)
            .map_err(|e| ScreenerError::Embedding(format!("Failed to load model: {}", e)))?;

        info!("Embedding model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Cosine similarity between two embeddings, in [-1, 1].
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(ScreenerError::Embedding(format!(
                "Embedding dimensions don't match: {} vs {}",
                a.len(),
                b.len()
            )));
        }
        if a.is_empty() {
            return Ok(0.0);
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            Ok(0.0)
        } else {
            Ok(dot_product / (norm_a * norm_b))
        }
    }
}

impl Embedder for EmbeddingEngine {
    fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
        self.model.encode(texts)
    }

    /// Single-text encode with a cache; the scoring path embeds the same
    /// resume for similarity and for classification.
    fn encode_single(&self, text: &str) -> Vec<f32> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(text) {
                return cached.clone();
            }
        }

        let embedding = self.model.encode_single(text);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(text.to_string(), embedding.clone());
        }

        embedding
    }
}

/// Map a cosine similarity to the 0-100 scale: `(cos + 1) / 2 * 100`,
/// rounded to 2 decimals and clamped.
pub fn normalize_similarity(cosine: f32) -> f64 {
    let normalized = ((f64::from(cosine) + 1.0) / 2.0) * 100.0;
    ((normalized * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

/// Similarity between a resume and an optional job description using the
/// given embedder. No job description is not an error; it yields the fixed
/// neutral score without touching the model.
pub fn similarity_score(
    embedder: &dyn Embedder,
    resume_text: &str,
    job_description: Option<&str>,
) -> Result<f64> {
    let job_description = match job_description {
        Some(jd) if !jd.trim().is_empty() => jd,
        _ => return Ok(NEUTRAL_SIMILARITY),
    };

    let resume_embedding = embedder.encode_single(resume_text);
    let jd_embedding = embedder.encode_single(job_description);
    let cosine = EmbeddingEngine::cosine_similarity(&resume_embedding, &jd_embedding)?;

    Ok(normalize_similarity(cosine))
}

/// Deterministic keyword-count embedder for hermetic tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::Embedder;

    pub(crate) struct StubEmbedder;

    const MARKERS: [&str; 4] = ["rust", "python", "sales", "design"];

    impl Embedder for StubEmbedder {
        fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
            texts.iter().map(|t| self.encode_single(t)).collect()
        }

        fn encode_single(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let mut v: Vec<f32> = MARKERS
                .iter()
                .map(|marker| lower.matches(marker).count() as f32)
                .collect();
            v.push(lower.len() as f32 / 100.0);
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubEmbedder;
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = vec![0.5, 0.5, 0.1];
        let similarity = EmbeddingEngine::cosine_similarity(&a, &a).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(EmbeddingEngine::cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let err = EmbeddingEngine::cosine_similarity(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ScreenerError::Embedding(_)));
    }

    #[test]
    fn test_normalize_similarity_range() {
        assert_eq!(normalize_similarity(1.0), 100.0);
        assert_eq!(normalize_similarity(-1.0), 0.0);
        assert_eq!(normalize_similarity(0.0), 50.0);
    }

    #[test]
    fn test_missing_job_description_is_neutral() {
        let score = similarity_score(&StubEmbedder, "any resume text", None).unwrap();
        assert_eq!(score, NEUTRAL_SIMILARITY);

        let blank = similarity_score(&StubEmbedder, "any resume text", Some("   ")).unwrap();
        assert_eq!(blank, NEUTRAL_SIMILARITY);
    }

    #[test]
    fn test_similarity_with_job_description() {
        let score =
            similarity_score(&StubEmbedder, "rust systems engineer", Some("rust engineer wanted"))
                .unwrap();
        assert!((0.0..=100.0).contains(&score));
        assert_ne!(score, NEUTRAL_SIMILARITY);
    }
}
