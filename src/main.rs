//! Resume screener: AI-powered resume parsing, scoring, and classification

mod cli;
mod config;
mod error;
mod input;
mod ml;
mod pipeline;
mod processing;

use clap::Parser;
use cli::{Cli, Commands, ConfigAction, ModelAction, SkillAction};
use colored::Colorize;
use config::Config;
use error::{Result, ScreenerError};
use log::{error, info};
use ml::classifier::TrainOptions;
use ml::engine::NlpEngine;
use ml::model_manager::ModelManager;
use ml::trainer::{load_training_pairs, retrain_and_swap, FeedbackLog, FeedbackRecord};
use pipeline::{ScreeningPipeline, ScreeningRecord, ScreeningRequest};
use processing::parser::ResumeParser;
use processing::skills::SkillCatalog;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            name,
            json,
        } => {
            cli::validate_file_extension(&resume, &["pdf", "docx", "doc"])
                .map_err(|e| ScreenerError::InvalidInput(format!("Resume file: {}", e)))?;

            let file_bytes = std::fs::read(&resume)?;
            let filename = resume
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| resume.display().to_string());

            let job_description = match job {
                Some(path) => Some(std::fs::read_to_string(&path)?),
                None => None,
            };

            let pipeline = build_pipeline(config)?;
            pipeline.engine().try_load_default_classifier().await;

            info!("Screening {}", filename);
            let record = pipeline
                .screen(ScreeningRequest {
                    file_bytes,
                    filename,
                    job_description,
                    candidate_name: name,
                })
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }

        Commands::Train {
            data,
            name,
            model_type,
            test_size,
            random_state,
        } => {
            let pairs = load_training_pairs(&data)?;
            let options = TrainOptions {
                test_size: test_size.unwrap_or(config.training.test_size),
                model_type: model_type.unwrap_or_else(|| config.training.model_type.clone()),
                random_state: random_state.unwrap_or(config.training.random_state),
            };

            println!(
                "Training {} classifier on {} samples...",
                options.model_type,
                pairs.len()
            );

            let engine = NlpEngine::new(config);
            let report = retrain_and_swap(&engine, pairs, &name, options).await?;

            println!("{}", "Training complete".green().bold());
            println!("  Accuracy:   {:.2}%", report.accuracy * 100.0);
            println!("  Categories: {}", report.num_categories);
            println!("  Samples:    {}", report.num_samples);
            for (category, metrics) in &report.classification_report {
                println!(
                    "  {:<24} precision {:.2}  recall {:.2}  f1 {:.2}  support {}",
                    category, metrics.precision, metrics.recall, metrics.f1_score, metrics.support
                );
            }
        }

        Commands::Predict { resume, name } => {
            cli::validate_file_extension(&resume, &["pdf", "docx", "doc"])
                .map_err(|e| ScreenerError::InvalidInput(format!("Resume file: {}", e)))?;

            let file_bytes = std::fs::read(&resume)?;
            let filename = resume
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| resume.display().to_string());

            let catalog = SkillCatalog::load(&config.processing.skills_catalog)?;
            let parser = ResumeParser::new(catalog);
            let parsed = parser.parse(&file_bytes, &filename)?;

            let engine = NlpEngine::new(config);
            engine.load_classifier(&name).await?;

            let prediction = engine
                .predict_category(&parsed.clean_text)
                .await?
                .ok_or_else(|| {
                    ScreenerError::ClassifierUnavailable("classifier did not load".to_string())
                })?;

            println!(
                "{} {} ({:.1}% confidence)",
                "Predicted category:".bold(),
                prediction.predicted_category.cyan(),
                prediction.confidence * 100.0
            );
            for ranked in &prediction.top_predictions {
                println!("  {:<24} {:.1}%", ranked.category, ranked.confidence * 100.0);
            }
        }

        Commands::Models { action } => match action {
            ModelAction::List => {
                let manager = ModelManager::new(&config).await?;
                println!("{}", "Available embedding models:".bold());
                for model in manager.available() {
                    let marker = if manager.is_downloaded(&model.name) {
                        "downloaded".green()
                    } else {
                        "remote".dimmed()
                    };
                    println!(
                        "  {:<16} {:<32} {:>5} MB  [{}]",
                        model.name, model.repo_id, model.size_mb, marker
                    );
                }
            }
            ModelAction::Download { model } => {
                let mut manager = ModelManager::new(&config).await?;
                let path = manager.download(&model).await?;
                println!("Model ready at {}", path.display());
            }
            ModelAction::Info { model } => {
                let info = config.get_model_by_name(&model).ok_or_else(|| {
                    ScreenerError::ModelNotFound(format!("Unknown embedding model: {}", model))
                })?;
                println!("{}", info.name.bold());
                println!("  Repository: {}", info.repo_id);
                println!("  Size:       {} MB", info.size_mb);
                println!("  Dimensions: {}", info.dimensions);
                println!("  {}", info.description);
            }
        },

        Commands::Skills { action } => match action {
            SkillAction::Show => {
                let catalog = SkillCatalog::load(&config.processing.skills_catalog)?;
                println!("{} skills in catalog:", catalog.len());
                for skill in catalog.skills() {
                    println!("  {}", skill);
                }
            }
            SkillAction::Update { skills } => {
                let total =
                    SkillCatalog::update_file(&config.processing.skills_catalog, skills.iter())?;
                println!(
                    "Catalog rewritten: {} entries at {}",
                    total,
                    config.processing.skills_catalog.display()
                );
            }
        },

        Commands::Feedback {
            candidate_id,
            predicted_score,
            predicted_category,
            actual_score,
            actual_category,
            note,
        } => {
            let log = FeedbackLog::new(&config.training.training_data_dir);
            log.append(&FeedbackRecord {
                candidate_id,
                predicted_score,
                predicted_category,
                actual_score,
                actual_category,
                hr_feedback: note,
                timestamp: chrono::Utc::now(),
            })?;
            println!("Feedback recorded at {}", log.path().display());
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    ScreenerError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("{}", content);
            }
            ConfigAction::Reset => {
                let fresh = Config::default();
                fresh.save()?;
                println!("Configuration reset to defaults");
            }
        },
    }

    Ok(())
}

fn build_pipeline(config: Config) -> Result<ScreeningPipeline> {
    let catalog = SkillCatalog::load(&config.processing.skills_catalog)?;
    let parser = ResumeParser::new(catalog);
    let engine = Arc::new(NlpEngine::new(config));
    Ok(ScreeningPipeline::new(parser, engine))
}

fn print_record(record: &ScreeningRecord) {
    let category = match record.category {
        processing::scorer::FitCategory::StrongFit => record.category.to_string().green().bold(),
        processing::scorer::FitCategory::MediumFit => record.category.to_string().yellow().bold(),
        processing::scorer::FitCategory::WeakFit => record.category.to_string().red().bold(),
    };

    if let Some(name) = &record.candidate_name {
        println!("{} {}", "Candidate:".bold(), name);
    }
    println!("{} {}", "File:".bold(), record.filename);
    println!();
    println!(
        "{} {:.2}  [{}]",
        "Total score:".bold(),
        record.total_ai_score,
        category
    );
    for component in &record.breakdown {
        println!(
            "  {:<12} {:>6.2}  (weight {:.1})",
            component.metric, component.score, component.weight
        );
    }

    if let Some(predicted) = &record.predicted_category {
        let confidence = record
            .category_confidence
            .map(|c| format!(" ({:.1}%)", c * 100.0))
            .unwrap_or_default();
        println!("{} {}{}", "Predicted role:".bold(), predicted.cyan(), confidence);
    }

    if let Some(years) = record.experience_years {
        println!("{} {:.1} years", "Experience:".bold(), years);
    }
    if let Some(role) = &record.last_role {
        println!("{} {}", "Last role:".bold(), role);
    }
    if let Some(email) = &record.email {
        println!("{} {}", "Email:".bold(), email);
    }

    if !record.skills.is_empty() {
        let skills: Vec<&str> = record.skills.iter().map(String::as_str).collect();
        println!("{} {}", "Skills:".bold(), skills.join(", "));
    }
    if !record.missing_skills.is_empty() {
        println!(
            "{} {}",
            "Missing skills:".bold(),
            record.missing_skills.join(", ").dimmed()
        );
    }
}
