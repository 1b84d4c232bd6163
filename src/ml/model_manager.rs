//! Embedding model management: download and local registry
//!
//! Model2Vec models are fetched from the HuggingFace Hub into the models
//! directory; the engine prefers a local copy and falls back to the repo id.

use crate::config::{AvailableModel, Config};
use crate::error::{Result, ScreenerError};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files that make a directory a usable Model2Vec model.
const REQUIRED_FILES: [&str; 3] = ["model.safetensors", "tokenizer.json", "config.json"];
const OPTIONAL_FILES: [&str; 1] = ["README.md"];

pub struct ModelManager {
    models_dir: PathBuf,
    registry: Vec<AvailableModel>,
    downloaded: HashSet<String>,
    api: Api,
}

impl ModelManager {
    pub async fn new(config: &Config) -> Result<Self> {
        let models_dir = config.models.models_dir.clone();
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await?;
        }

        let api = Api::new()
            .map_err(|e| ScreenerError::Configuration(format!("Failed to initialize HF API: {}", e)))?;

        let mut manager = Self {
            models_dir,
            registry: config.models.available_models.clone(),
            downloaded: HashSet::new(),
            api,
        };
        manager.scan_downloaded().await?;
        Ok(manager)
    }

    async fn scan_downloaded(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if Self::is_valid_model_dir(&entry.path()).await {
                    self.downloaded.insert(name);
                }
            }
        }
        Ok(())
    }

    async fn is_valid_model_dir(path: &Path) -> bool {
        for file in &REQUIRED_FILES {
            if fs::metadata(path.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Download a registered model into the models directory.
    pub async fn download(&mut self, name: &str) -> Result<PathBuf> {
        let model = self
            .registry
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ScreenerError::ModelNotFound(format!("Unknown embedding model: {}", name)))?
            .clone();

        let model_dir = self.models_dir.join(name);
        if self.downloaded.contains(name) {
            info!("Model {} already downloaded", name);
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            model.name, model.size_mb, model.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let repo = self.api.repo(hf_hub::Repo::model(model.repo_id.clone()));

        for file in REQUIRED_FILES.iter().chain(OPTIONAL_FILES.iter()) {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await?;
                    info!("Downloaded {}", file);
                }
                Err(e) if OPTIONAL_FILES.contains(file) => {
                    warn!("Optional file {} not available: {}", file, e);
                }
                Err(e) => {
                    return Err(ScreenerError::ModelNotFound(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded.insert(name.to_string());
        info!("Embedding model {} ready", model.name);
        Ok(model_dir)
    }

    pub fn available(&self) -> &[AvailableModel] {
        &self.registry
    }

    pub fn downloaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.downloaded.iter().cloned().collect();
        names.sort();
        names
    }

    pub fn is_downloaded(&self, name: &str) -> bool {
        self.downloaded.contains(name)
    }

    /// First registered model that is already local, else the first entry.
    pub fn auto_select(&self) -> Option<&AvailableModel> {
        self.registry
            .iter()
            .find(|m| self.downloaded.contains(&m.name))
            .or_else(|| self.registry.first())
    }
}
