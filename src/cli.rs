//! CLI interface for the resume screener

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-screener")]
#[command(about = "AI-powered resume screening pipeline")]
#[command(
    long_about = "Parse resumes, score them against job descriptions with embeddings and \
                  heuristics, and classify them into job categories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and score a resume, optionally against a job description
    Score {
        /// Path to resume file (PDF, DOCX)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to a job description text file
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Candidate name to attach to the record
        #[arg(short, long)]
        name: Option<String>,

        /// Emit the full record as JSON instead of a console summary
        #[arg(long)]
        json: bool,
    },

    /// Train the category classifier from (text, category) JSONL pairs
    Train {
        /// Path to a JSONL file with {"text": ..., "category": ...} lines
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact name to save under
        #[arg(short, long, default_value = "category_classifier")]
        name: String,

        /// Classifier family: logistic or random_forest
        #[arg(short, long)]
        model_type: Option<String>,

        /// Held-out fraction for evaluation
        #[arg(short, long)]
        test_size: Option<f64>,

        /// Random seed for the split and forest bagging
        #[arg(short, long)]
        random_state: Option<u64>,
    },

    /// Predict the job category of a single resume
    Predict {
        /// Path to resume file (PDF, DOCX)
        #[arg(short, long)]
        resume: PathBuf,

        /// Classifier artifact name to load
        #[arg(short, long, default_value = "category_classifier")]
        name: String,
    },

    /// Embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Skill catalog management
    Skills {
        #[command(subcommand)]
        action: SkillAction,
    },

    /// Record HR feedback for the next training batch
    Feedback {
        /// Candidate identifier
        #[arg(long)]
        candidate_id: String,

        /// Score the screener predicted
        #[arg(long)]
        predicted_score: f64,

        /// Category the screener predicted
        #[arg(long)]
        predicted_category: String,

        /// Corrected score from HR
        #[arg(long)]
        actual_score: Option<f64>,

        /// Corrected category from HR
        #[arg(long)]
        actual_category: Option<String>,

        /// Free-form feedback note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available and downloaded embedding models
    List,

    /// Download an embedding model
    Download {
        /// Model name from the registry
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum SkillAction {
    /// Print the current skill catalog
    Show,

    /// Union new entries into the catalog file and rewrite it
    Update {
        /// Skills to add
        #[arg(required = true)]
        skills: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

/// Validate file extension before reading anything.
pub fn validate_file_extension(path: &PathBuf, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
