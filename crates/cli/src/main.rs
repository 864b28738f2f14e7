//! Student Predictor CLI
//!
//! A command-line tool for requesting exam score and pass/fail predictions
//! from a running student-predictor service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::predict::{self, StudentArgs};
use commands::status;
use std::process::ExitCode;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Student Predictor CLI
#[derive(Parser)]
#[command(name = "spctl")]
#[command(author, version, about = "CLI for the Student Performance Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SP_API_URL env var)
    #[arg(long, env = "SP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List accepted parental education levels
    Levels,

    /// Show service health and loaded models
    Health,

    /// Request a prediction for one student
    #[command(subcommand)]
    Predict(PredictCommands),
}

#[derive(Subcommand)]
pub enum PredictCommands {
    /// Predict the exam score and letter grade
    Score(StudentArgs),

    /// Predict pass/fail with class probabilities
    Outcome(StudentArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<client::ApiError>() {
                Some(client::ApiError::Rejected { message }) => {
                    output::print_error(&format!("Input rejected: {}", message));
                    output::print_warning("Run `spctl levels` to see accepted parental levels");
                }
                _ => output::print_error(&format!("{:#}", err)),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = config::Config::load()?;

    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let timeout = cli
        .timeout
        .or(file_config.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    if cli.verbose {
        output::print_info(&format!("Using API at {} (timeout {}s)", api_url, timeout));
    }

    // Initialize client
    let client = client::ApiClient::new(&api_url, Duration::from_secs(timeout))?;

    // Execute command
    match cli.command {
        Commands::Levels => status::list_levels(&client, cli.format).await?,
        Commands::Health => status::show_health(&client, cli.format).await?,
        Commands::Predict(predict_cmd) => match predict_cmd {
            PredictCommands::Score(student) => {
                predict::predict_score(&client, student, cli.format).await?
            }
            PredictCommands::Outcome(student) => {
                predict::predict_outcome(&client, student, cli.format).await?
            }
        },
    }

    Ok(())
}
