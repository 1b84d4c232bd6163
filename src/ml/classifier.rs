//! Job-category classification over resume embeddings
//!
//! Lifecycle: untrained -> trained in memory -> persisted on disk -> loaded
//! and serving. A loaded instance is immutable; retraining builds a new
//! artifact that replaces the old one wholesale.

use crate::error::{Result, ScreenerError};
use crate::ml::embeddings::Embedder;
use crate::ml::models::{
    accuracy, classification_report, stratified_split, ClassMetrics, FittedModel, LabelEncoder,
    LogisticRegression, ModelType, RandomForest,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const CLASSIFIER_FILE: &str = "classifier.json";
const LABEL_ENCODER_FILE: &str = "label_encoder.json";
const LOGISTIC_MAX_ITER: usize = 1000;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub test_size: f64,
    pub model_type: String,
    pub random_state: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            model_type: "logistic".to_string(),
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub num_categories: usize,
    pub num_samples: usize,
    pub categories: Vec<String>,
    pub classification_report: BTreeMap<String, ClassMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCategory {
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub predicted_category: String,
    pub confidence: f64,
    pub top_predictions: Vec<RankedCategory>,
    pub all_probabilities: BTreeMap<String, f64>,
}

struct LoadedState {
    model: FittedModel,
    encoder: LabelEncoder,
}

pub struct CategoryClassifier {
    embedder: Arc<dyn Embedder>,
    models_dir: PathBuf,
    batch_size: usize,
    state: Option<LoadedState>,
}

impl CategoryClassifier {
    pub fn new(embedder: Arc<dyn Embedder>, models_dir: PathBuf, batch_size: usize) -> Self {
        Self {
            embedder,
            models_dir,
            batch_size: batch_size.max(1),
            state: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// Fit the label encoder and a classifier on resume embeddings.
    /// Configuration problems (bad model type, unbalanced data) fail before
    /// any embedding work is done.
    pub fn train(
        &mut self,
        resumes: &[String],
        categories: &[String],
        options: &TrainOptions,
    ) -> Result<TrainingReport> {
        if resumes.is_empty() || resumes.len() != categories.len() {
            return Err(ScreenerError::TrainingConfig(format!(
                "Expected matching non-empty resumes and categories, got {} and {}",
                resumes.len(),
                categories.len()
            )));
        }
        let model_type: ModelType = options.model_type.parse()?;

        let encoder = LabelEncoder::fit(categories);
        let labels: Vec<usize> = categories
            .iter()
            .map(|c| encoder.transform(c))
            .collect::<Result<_>>()?;

        // Cheap label-only validation happens before the expensive embedding
        let (train_idx, test_idx) = stratified_split(
            &labels,
            encoder.len(),
            options.test_size,
            options.random_state,
        )?;

        info!(
            "Training {} classifier on {} samples across {} categories",
            options.model_type,
            resumes.len(),
            encoder.len()
        );

        let embeddings = self.embed_all(resumes);
        let n_features = embeddings.first().map(|e| e.len()).unwrap_or(0);
        if n_features == 0 {
            return Err(ScreenerError::TrainingConfig(
                "Embedding model produced empty vectors".to_string(),
            ));
        }

        let x_train = gather_matrix(&embeddings, &train_idx, n_features);
        let y_train: Vec<usize> = train_idx.iter().map(|&i| labels[i]).collect();

        let model = match model_type {
            ModelType::Logistic => FittedModel::Logistic(LogisticRegression::fit(
                &x_train,
                &y_train,
                encoder.len(),
                LOGISTIC_MAX_ITER,
            )),
            ModelType::RandomForest => FittedModel::RandomForest(RandomForest::fit(
                &x_train,
                &y_train,
                encoder.len(),
                options.random_state,
            )),
        };

        let y_test: Vec<usize> = test_idx.iter().map(|&i| labels[i]).collect();
        let y_pred: Vec<usize> = test_idx
            .iter()
            .map(|&i| model.predict(&embeddings[i]))
            .collect();

        let report = TrainingReport {
            accuracy: accuracy(&y_test, &y_pred),
            num_categories: encoder.len(),
            num_samples: resumes.len(),
            categories: encoder.classes().to_vec(),
            classification_report: classification_report(&y_test, &y_pred, &encoder),
        };

        info!(
            "Training complete: accuracy {:.2}% on {} held-out samples",
            report.accuracy * 100.0,
            y_test.len()
        );

        self.state = Some(LoadedState { model, encoder });
        Ok(report)
    }

    /// Predict the category of a single resume with confidence detail.
    pub fn predict(&self, resume_text: &str) -> Result<CategoryPrediction> {
        let state = self.require_state()?;

        let embedding = to_f64(&self.embedder.encode_single(resume_text));
        let probabilities = state.model.predict_proba(&embedding);

        let mut ranked: Vec<RankedCategory> = probabilities
            .iter()
            .enumerate()
            .map(|(index, &confidence)| RankedCategory {
                category: state.encoder.inverse(index).to_string(),
                confidence,
            })
            .collect();
        ranked.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        let all_probabilities: BTreeMap<String, f64> = ranked
            .iter()
            .map(|r| (r.category.clone(), r.confidence))
            .collect();

        let top = ranked[0].clone();
        ranked.truncate(3);

        Ok(CategoryPrediction {
            predicted_category: top.category,
            confidence: top.confidence,
            top_predictions: ranked,
            all_probabilities,
        })
    }

    /// Labels-only batch prediction for throughput.
    pub fn predict_batch(&self, resume_texts: &[String]) -> Result<Vec<String>> {
        let state = self.require_state()?;

        if resume_texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.encode(resume_texts);
        Ok(embeddings
            .iter()
            .map(|embedding| {
                let label = state.model.predict(&to_f64(embedding));
                state.encoder.inverse(label).to_string()
            })
            .collect())
    }

    /// Persist the classifier and label encoder as two files under a named
    /// directory. The write is staged in a temp directory and renamed into
    /// place so a crash can never leave one file without the other.
    pub fn save(&self, name: &str) -> Result<PathBuf> {
        let state = self.require_state()?;

        std::fs::create_dir_all(&self.models_dir)?;
        let target = self.models_dir.join(name);
        let staging = self.models_dir.join(format!("{}.tmp", name));

        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        std::fs::write(
            staging.join(CLASSIFIER_FILE),
            serde_json::to_string(&state.model)?,
        )?;
        std::fs::write(
            staging.join(LABEL_ENCODER_FILE),
            serde_json::to_string(&state.encoder)?,
        )?;

        if target.exists() {
            std::fs::remove_dir_all(&target)?;
        }
        std::fs::rename(&staging, &target)?;

        info!("Model saved to {}", target.display());
        Ok(target)
    }

    /// Load a previously saved artifact, fully replacing any current state.
    pub fn load(&mut self, name: &str) -> Result<()> {
        let model_path = self.models_dir.join(name);
        let classifier_path = model_path.join(CLASSIFIER_FILE);
        let encoder_path = model_path.join(LABEL_ENCODER_FILE);

        match (classifier_path.exists(), encoder_path.exists()) {
            (false, false) => {
                return Err(ScreenerError::ModelNotFound(format!(
                    "No model named '{}' under {}",
                    name,
                    self.models_dir.display()
                )))
            }
            (true, true) => {}
            _ => {
                return Err(ScreenerError::ArtifactCorruption(format!(
                    "Model '{}' is incomplete: expected both {} and {}",
                    name, CLASSIFIER_FILE, LABEL_ENCODER_FILE
                )))
            }
        }

        let model: FittedModel =
            serde_json::from_str(&std::fs::read_to_string(&classifier_path)?)?;
        let encoder: LabelEncoder =
            serde_json::from_str(&std::fs::read_to_string(&encoder_path)?)?;

        self.state = Some(LoadedState { model, encoder });
        info!("Model loaded from {}", model_path.display());
        Ok(())
    }

    fn require_state(&self) -> Result<&LoadedState> {
        self.state.as_ref().ok_or_else(|| {
            ScreenerError::ClassifierUnavailable(
                "call train() or load a saved model first".to_string(),
            )
        })
    }

    fn embed_all(&self, texts: &[String]) -> Vec<Vec<f64>> {
        let progress = ProgressBar::new(texts.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                .expect("Invalid progress template")
                .progress_chars("=> "),
        );
        progress.set_message("Embedding resumes");

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            for embedding in self.embedder.encode(batch) {
                embeddings.push(to_f64(&embedding));
            }
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();
        embeddings
    }
}

fn to_f64(embedding: &[f32]) -> Vec<f64> {
    embedding.iter().map(|&v| f64::from(v)).collect()
}

fn gather_matrix(embeddings: &[Vec<f64>], indices: &[usize], n_features: usize) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((indices.len(), n_features));
    for (row, &index) in indices.iter().enumerate() {
        for (col, &value) in embeddings[index].iter().enumerate() {
            matrix[[row, col]] = value;
        }
    }
    matrix
}
