//! Sheetload CLI - Clean a CSV file and upload it to Google Sheets
//!
//! ```bash
//! sheetload --input data.csv --config job.json                 # upload using the config's mode
//! sheetload --input data.csv --config job.json --mode append   # override the mode
//! sheetload --input data.csv --config job.json --dry-run       # clean and preview, no upload
//! ```
//!
//! The service-account key path is read from `GOOGLE_CREDS_PATH` (a `.env`
//! file in the working directory is loaded first).
//!
//! Exit status: 0 on success, 1 for missing or unusable credentials,
//! 2 for any other failure.

use clap::Parser;
use sheetload::logs::{log_error, log_info, log_success, log_warning};
use sheetload::{
    clean, load_config, parse_csv_file, write_to_sheet, Credentials, Dataset, GoogleSheetsClient,
    ImportConfig, ImportResult, InMemorySheets, ServiceAccountTokens, TransformReport, WriteMode,
};
use std::path::PathBuf;

const EXIT_CREDENTIALS: i32 = 1;
const EXIT_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(name = "sheetload")]
#[command(about = "Clean a CSV file and upload it to Google Sheets", long_about = None)]
struct Cli {
    /// Input CSV file
    #[arg(long)]
    input: PathBuf,

    /// Job config (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Override the write mode from the config
    #[arg(long, value_enum)]
    mode: Option<WriteMode>,

    /// Clean and write to an in-memory sheet, print the report, skip the upload
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log_error(e.to_string());
        let code = if e.is_credentials() {
            EXIT_CREDENTIALS
        } else {
            EXIT_FAILURE
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> ImportResult<()> {
    let config = load_config(&cli.config)?.with_mode_override(cli.mode);

    // Resolved once, before reading any input
    let credentials = if cli.dry_run {
        None
    } else {
        Some(Credentials::from_env()?)
    };

    log_info("Reading CSV...");
    let dataset = parse_csv_file(&cli.input)?;

    log_info("Cleaning data...");
    let (cleaned, report) = clean(dataset, &config);
    log_info(report.summary());
    if report.invalid_dates > 0 {
        log_warning(format!(
            "{} date values could not be parsed and were left empty",
            report.invalid_dates
        ));
    }

    match credentials {
        Some(credentials) => upload(&credentials, &config, &cleaned).await,
        None => preview(&config, &cleaned, &report).await,
    }
}

async fn upload(
    credentials: &Credentials,
    config: &ImportConfig,
    cleaned: &Dataset,
) -> ImportResult<()> {
    log_info("Connecting to Google Sheets...");
    let tokens = ServiceAccountTokens::from_credentials(credentials)?;
    let client = GoogleSheetsClient::new(tokens);

    log_info(format!(
        "Uploading to Sheet='{}' Worksheet='{}' Mode='{}' ...",
        config.sheet_name, config.worksheet_name, config.mode
    ));
    let url = write_to_sheet(
        &client,
        &config.sheet_name,
        &config.worksheet_name,
        cleaned,
        config.mode,
    )
    .await?;

    log_success(format!("DONE. Sheet URL: {}", url));
    Ok(())
}

async fn preview(
    config: &ImportConfig,
    cleaned: &Dataset,
    report: &TransformReport,
) -> ImportResult<()> {
    log_info(format!(
        "Dry run: writing to in-memory Sheet='{}' Worksheet='{}' Mode='{}' ...",
        config.sheet_name, config.worksheet_name, config.mode
    ));
    let client = InMemorySheets::new();
    write_to_sheet(
        &client,
        &config.sheet_name,
        &config.worksheet_name,
        cleaned,
        config.mode,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(report)?);
    log_success(format!(
        "Dry run complete: {} rows x {} columns would be written",
        cleaned.len() + 1,
        cleaned.columns.len()
    ));
    Ok(())
}
