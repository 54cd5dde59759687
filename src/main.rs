use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;

use labport::config::{self, AppConfig};
use labport::intake::{IntakeService, Submission};
use labport::models::document::Document;
use labport::models::patient::PatientDetails;
use labport::notify::WebhookNotifier;
use labport::pipeline::extraction::pdf::ReportTextExtractor;
use labport::pipeline::processor::ReportProcessor;
use labport::pipeline::structuring::client::ChatCompletionsClient;
use labport::storage::vault::LocalVaultGateway;

/// Collect a patient's lab reports, extract the test results, and file
/// everything in the vault.
#[derive(Parser)]
#[command(name = "labport", version, about)]
struct Cli {
    /// Report files to process (PDF)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Name of the patient
    #[arg(long)]
    name: String,

    /// Contact number
    #[arg(long)]
    contact: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Consultation date (DD-MM-YYYY)
    #[arg(long)]
    date: Option<String>,
}

fn main() -> ExitCode {
    labport::init_tracing();
    let cli = Cli::parse();

    let app_config = match AppConfig::from_env() {
        Ok(app_config) => app_config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let consultation_date = match &cli.date {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(raw, "%d-%m-%Y") {
            Ok(date) => Some(date),
            Err(_) => {
                eprintln!("--date must be DD-MM-YYYY, got: {raw}");
                return ExitCode::FAILURE;
            }
        },
    };

    let patient = PatientDetails {
        name: cli.name,
        contact_number: cli.contact,
        email: cli.email,
        consultation_date,
    };

    let mut documents = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match Document::from_path(path) {
            Ok(document) => documents.push(document),
            Err(e) => {
                eprintln!("cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    tracing::info!(
        "{} v{} starting, {} document(s)",
        config::APP_NAME,
        config::APP_VERSION,
        documents.len()
    );

    let processor = ReportProcessor::new(
        Box::new(ReportTextExtractor),
        Box::new(ChatCompletionsClient::from_config(&app_config)),
    );
    let mut service = IntakeService::new(
        processor,
        Box::new(LocalVaultGateway::new(&app_config.vault_dir)),
    );
    if let Some(url) = &app_config.webhook_url {
        service = service.with_notifier(WebhookNotifier::new(url, app_config.request_timeout_secs));
    }

    let outcomes = service.submit(&Submission { patient, documents });

    let mut failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(stored) if stored.no_data => {
                println!(
                    "{}: no interpretable data (filed as {})",
                    outcome.file_name, stored.storage_key
                );
            }
            Ok(stored) => {
                println!(
                    "{}: {} record(s) filed as {}",
                    outcome.file_name, stored.record_count, stored.storage_key
                );
            }
            Err(e) => {
                failures += 1;
                println!("{}: failed: {e}", outcome.file_name);
            }
        }
    }

    if !outcomes.is_empty() && failures == outcomes.len() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
