//! Offline training glue: feedback capture and retrain-and-swap
//!
//! Dataset cleaning lives upstream; this module only consumes already-clean
//! (text, label) pairs and appends feedback events for the next batch.

use crate::config::Config;
use crate::error::{Result, ScreenerError};
use crate::ml::classifier::{CategoryClassifier, TrainOptions, TrainingReport};
use crate::ml::engine::NlpEngine;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

const FEEDBACK_FILE: &str = "feedback.jsonl";

/// One scoring outcome plus optional human correction, appended per event
/// and consumed by the next offline training batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub candidate_id: String,
    pub predicted_score: f64,
    pub predicted_category: String,
    pub actual_score: Option<f64>,
    pub actual_category: Option<String>,
    pub hr_feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Append-only JSONL feedback log.
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(training_data_dir: &Path) -> Self {
        Self {
            path: training_data_dir.join(FEEDBACK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &FeedbackRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<FeedbackRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ScreenerError::from))
            .collect()
    }
}

/// One already-cleaned training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPair {
    pub text: String,
    pub category: String,
}

/// Load (text, category) pairs from a JSONL file, one object per line.
pub fn load_training_pairs(path: &Path) -> Result<Vec<TrainingPair>> {
    let content = std::fs::read_to_string(path)?;
    let pairs: Vec<TrainingPair> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(ScreenerError::from))
        .collect::<Result<_>>()?;

    if pairs.is_empty() {
        return Err(ScreenerError::TrainingConfig(format!(
            "No training pairs found in {}",
            path.display()
        )));
    }
    Ok(pairs)
}

/// Full offline retrain: fit on the pairs, persist under `name`, then load
/// a fresh instance into the engine so serving switches generations
/// atomically. The previous artifact keeps serving until the swap.
pub async fn retrain_and_swap(
    engine: &NlpEngine,
    pairs: Vec<TrainingPair>,
    name: &str,
    options: TrainOptions,
) -> Result<TrainingReport> {
    let embedder = engine.embedder().await?;
    let config: &Config = engine.config();
    let models_dir = config.models.models_dir.clone();
    let batch_size = config.processing.batch_size;
    let name_owned = name.to_string();

    let report = tokio::task::spawn_blocking(move || {
        let (resumes, categories): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|pair| (pair.text, pair.category))
            .unzip();

        let mut classifier = CategoryClassifier::new(embedder, models_dir, batch_size);
        let report = classifier.train(&resumes, &categories, &options)?;
        classifier.save(&name_owned)?;
        Ok::<TrainingReport, ScreenerError>(report)
    })
    .await
    .map_err(|e| ScreenerError::Embedding(format!("Training task failed: {}", e)))??;

    engine.load_classifier(name).await?;
    info!("Retrained '{}' and swapped it into serving", name);
    Ok(report)
}
