use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod adherence;
mod config;
mod db;
mod engine;
mod error;
mod heuristics;
mod models;
mod progress_log;
mod recommendations;
mod report;
mod timeline;
mod trends;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::models::PatientRecord;

#[derive(Parser)]
#[command(name = "clinic-progress")]
#[command(about = "Patient progress analysis for the nutrition clinic", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PatientArgs {
    #[arg(long)]
    patient_id: Option<Uuid>,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo patients, records and plans
    Seed,
    /// Import clinical records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Analyze a patient's progress and update the progress log
    Analyze {
        #[command(flatten)]
        patient: PatientArgs,
        /// Reference date for plan duration (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze a patient and write a markdown progress report
    Report {
        #[command(flatten)]
        patient: PatientArgs,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "progress-report.md")]
        out: PathBuf,
    },
    /// List stored progress-log entries, newest first
    History {
        #[command(flatten)]
        patient: PatientArgs,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let default_filter = if verbose { "debug" } else { config.log_filter.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn resolve_patient(pool: &PgPool, args: &PatientArgs) -> anyhow::Result<PatientRecord> {
    let patient = match (&args.patient_id, &args.email) {
        (Some(id), _) => db::find_patient_by_id(pool, *id).await?,
        (None, Some(email)) => db::find_patient_by_email(pool, email).await?,
        (None, None) => anyhow::bail!("either --patient-id or --email is required"),
    };

    patient.context("patient not found")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_logging(&config, cli.verbose);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    info!(max_connections = config.max_connections, "connected to Postgres");

    let store = PgStore::new(pool.clone());
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} clinical records from {}.", csv.display());
        }
        Commands::Analyze {
            patient,
            as_of,
            json,
        } => {
            let patient = resolve_patient(&pool, &patient).await?;
            let result =
                engine::analyze_patient_progress(&store, &store, patient.id, as_of.unwrap_or(today))
                    .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let weight = &result.weight_progress;
            let adherence = &result.diet_plan_adherence;
            println!("Progress for {} ({}):", patient.full_name, patient.email);
            println!(
                "- weight {:+.1} kg ({}), waist {:+.1} cm ({})",
                weight.change,
                weight.trend,
                result.anthropometric_progress.waist_change,
                result.anthropometric_progress.body_composition_trend
            );
            println!(
                "- {} ({})",
                adherence.expected_progress_text, adherence.actual_vs_expected
            );
            for flag in &result.recommendations.concern_flags {
                println!("- concern: {flag}");
            }
            for factor in &result.recommendations.positive_factors {
                println!("- positive: {factor}");
            }
            for change in &result.recommendations.suggested_changes {
                println!("- suggestion: {change}");
            }
        }
        Commands::Report {
            patient,
            as_of,
            out,
        } => {
            let patient = resolve_patient(&pool, &patient).await?;
            let as_of = as_of.unwrap_or(today);
            let result =
                engine::analyze_patient_progress(&store, &store, patient.id, as_of).await?;
            let report = report::build_report(&patient, as_of, &result);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::History { patient, limit } => {
            let patient = resolve_patient(&pool, &patient).await?;
            let entries = db::fetch_progress_logs(&pool, patient.id, limit).await?;

            if entries.is_empty() {
                println!("No progress log entries for {}.", patient.full_name);
                return Ok(());
            }

            println!("Progress log for {}:", patient.full_name);
            for entry in entries {
                println!(
                    "- {} adherence {} feeling {}/5: {}",
                    entry.date, entry.adherence_score, entry.feeling_level, entry.notes
                );
            }
        }
    }

    Ok(())
}
