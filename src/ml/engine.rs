//! NLP engine: shared embedding model and serving classifier
//!
//! The embedding model is expensive to load, so initialization is lazy and
//! single-flight; afterwards reads are lock-free Arc clones. The serving
//! classifier lives behind a slot that is only ever replaced wholesale, so
//! in-flight requests keep the generation they started with.

use crate::config::Config;
use crate::error::{Result, ScreenerError};
use crate::ml::classifier::{CategoryClassifier, CategoryPrediction};
use crate::ml::embeddings::{similarity_score, Embedder, EmbeddingEngine, NEUTRAL_SIMILARITY};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;

pub struct NlpEngine {
    config: Config,
    embedder: OnceCell<Arc<dyn Embedder>>,
    classifier: RwLock<Option<Arc<CategoryClassifier>>>,
}

impl NlpEngine {
    /// Cheap to construct; the embedding model loads on first use.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            embedder: OnceCell::new(),
            classifier: RwLock::new(None),
        }
    }

    /// Construct with a pre-built embedder; used by tests and callers that
    /// manage model loading themselves.
    pub fn with_embedder(config: Config, embedder: Arc<dyn Embedder>) -> Self {
        let cell = OnceCell::new();
        cell.set(embedder).ok();
        Self {
            config,
            embedder: cell,
            classifier: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared embedder handle, initialized exactly once under concurrent
    /// callers. Loading happens on a blocking thread.
    pub async fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let embedder = self
            .embedder
            .get_or_try_init(|| async {
                let model_name = self.config.models.default_embedding_model.clone();
                let model_path = self.resolve_model_path(&model_name);

                let engine = tokio::task::spawn_blocking(move || {
                    EmbeddingEngine::new(&model_path, &model_name)
                })
                .await
                .map_err(|e| ScreenerError::Embedding(format!("Model load task failed: {}", e)))??;

                Ok::<Arc<dyn Embedder>, ScreenerError>(Arc::new(engine))
            })
            .await?;

        Ok(Arc::clone(embedder))
    }

    /// Local model directory when downloaded, otherwise the HuggingFace
    /// repo id for model2vec to resolve.
    fn resolve_model_path(&self, model_name: &str) -> PathBuf {
        let local = self.config.models.models_dir.join(model_name);
        if local.exists() {
            return local;
        }
        match self.config.get_model_by_name(model_name) {
            Some(model) => PathBuf::from(&model.repo_id),
            None => PathBuf::from(model_name),
        }
    }

    /// Resume/job-description similarity on the 0-100 scale. A missing job
    /// description short-circuits to the neutral score without touching the
    /// embedding model.
    pub async fn similarity(&self, resume_text: &str, job_description: Option<&str>) -> Result<f64> {
        match job_description {
            Some(jd) if !jd.trim().is_empty() => {
                let embedder = self.embedder().await?;
                let resume = resume_text.to_string();
                let jd = jd.to_string();

                tokio::task::spawn_blocking(move || {
                    similarity_score(embedder.as_ref(), &resume, Some(&jd))
                })
                .await
                .map_err(|e| ScreenerError::Embedding(format!("Similarity task failed: {}", e)))?
            }
            _ => Ok(NEUTRAL_SIMILARITY),
        }
    }

    /// Category prediction that degrades to `None` when no classifier has
    /// been loaded; absence is not an error on the scoring path.
    pub async fn predict_category(&self, resume_text: &str) -> Result<Option<CategoryPrediction>> {
        let classifier = self.classifier();
        let Some(classifier) = classifier else {
            debug!("No classifier loaded; skipping category prediction");
            return Ok(None);
        };

        let text = resume_text.to_string();
        let prediction = tokio::task::spawn_blocking(move || classifier.predict(&text))
            .await
            .map_err(|e| ScreenerError::Embedding(format!("Prediction task failed: {}", e)))??;

        Ok(Some(prediction))
    }

    /// Currently serving classifier generation, if any.
    pub fn classifier(&self) -> Option<Arc<CategoryClassifier>> {
        self.classifier
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(Arc::clone))
    }

    /// Load a named artifact into a fresh instance and swap it in as one
    /// unit; in-flight readers keep the previous generation.
    pub async fn load_classifier(&self, name: &str) -> Result<()> {
        let artifact_dir = self.config.models.models_dir.join(name);
        if !artifact_dir.exists() {
            // Checked before the embedder spins up so a missing artifact
            // never costs a model load
            return Err(ScreenerError::ModelNotFound(format!(
                "No model named '{}' under {}",
                name,
                self.config.models.models_dir.display()
            )));
        }

        let embedder = self.embedder().await?;
        let models_dir = self.config.models.models_dir.clone();
        let batch_size = self.config.processing.batch_size;
        let name = name.to_string();

        let loaded = tokio::task::spawn_blocking(move || {
            let mut classifier = CategoryClassifier::new(embedder, models_dir, batch_size);
            classifier.load(&name)?;
            Ok::<CategoryClassifier, ScreenerError>(classifier)
        })
        .await
        .map_err(|e| ScreenerError::Embedding(format!("Classifier load task failed: {}", e)))??;

        if let Ok(mut slot) = self.classifier.write() {
            *slot = Some(Arc::new(loaded));
        }
        info!("Classifier generation swapped in");
        Ok(())
    }

    /// Best-effort startup load of the configured default classifier;
    /// absence just means category prediction stays off.
    pub async fn try_load_default_classifier(&self) -> bool {
        let name = self.config.models.default_classifier.clone();
        match self.load_classifier(&name).await {
            Ok(()) => true,
            Err(ScreenerError::ModelNotFound(_)) => {
                debug!("Default classifier '{}' not present", name);
                false
            }
            Err(e) => {
                warn!("Failed to load default classifier '{}': {}", name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::TrainOptions;
    use crate::ml::embeddings::test_support::StubEmbedder;
    use tempfile::TempDir;

    fn engine_with_stub(models_dir: &TempDir) -> NlpEngine {
        let mut config = Config::default();
        config.models.models_dir = models_dir.path().to_path_buf();
        NlpEngine::with_embedder(config, Arc::new(StubEmbedder))
    }

    #[tokio::test]
    async fn test_similarity_without_job_description_is_neutral() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with_stub(&dir);

        assert_eq!(engine.similarity("any resume", None).await.unwrap(), 50.0);
        assert_eq!(engine.similarity("other resume", Some(" ")).await.unwrap(), 50.0);
    }

    #[tokio::test]
    async fn test_similarity_with_job_description() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with_stub(&dir);

        let score = engine
            .similarity("rust engineer resume", Some("hiring rust engineer"))
            .await
            .unwrap();
        assert!((0.0..=100.0).contains(&score));
    }

    #[tokio::test]
    async fn test_predict_category_degrades_without_classifier() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with_stub(&dir);

        assert!(engine.predict_category("any resume").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_classifier_swaps_generation() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with_stub(&dir);

        // Train and persist an artifact out of band
        let mut trained = CategoryClassifier::new(
            Arc::new(StubEmbedder),
            dir.path().to_path_buf(),
            4,
        );
        let resumes = vec![
            "rust services".to_string(),
            "rust tooling".to_string(),
            "rust platform".to_string(),
            "sales quota".to_string(),
            "sales pipeline".to_string(),
            "sales leads".to_string(),
        ];
        let categories = vec![
            "Backend".to_string(),
            "Backend".to_string(),
            "Backend".to_string(),
            "Sales".to_string(),
            "Sales".to_string(),
            "Sales".to_string(),
        ];
        trained
            .train(&resumes, &categories, &TrainOptions::default())
            .unwrap();
        trained.save("category_classifier").unwrap();

        assert!(engine.classifier().is_none());
        engine.load_classifier("category_classifier").await.unwrap();

        let first = engine.classifier().unwrap();
        let prediction = engine.predict_category("rust everywhere").await.unwrap().unwrap();
        assert_eq!(prediction.predicted_category, "Backend");

        // Reload publishes a new generation; the old Arc stays valid
        engine.load_classifier("category_classifier").await.unwrap();
        let second = engine.classifier().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.is_ready());
    }

    #[tokio::test]
    async fn test_missing_default_classifier_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with_stub(&dir);
        assert!(!engine.try_load_default_classifier().await);
    }
}
