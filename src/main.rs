//! Candilyzer - GitHub + LinkedIn candidate analyzer for tech hiring
//!
//! Serves a web UI (or runs in the terminal) that streams a DeepSeek agent's
//! evaluation of job candidates and extracts the final score.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, connection, API failure, etc.)
//!   2 - Invalid submission (missing fields or credentials)
//!   130 - Interrupted

mod agent;
mod analysis;
mod cli;
mod config;
mod credentials;
mod errors;
mod models;
mod prompts;
mod request;
mod server;

use agent::{AgentConfig, CandidateAgent};
use anyhow::{Context, Result};
use cli::{Args, Command};
use config::{Config, DEFAULT_CONFIG_FILE};
use credentials::CredentialSet;
use errors::ValidationError;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisKind, AnalysisUpdate};
use request::AnalysisForm;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const EXIT_INVALID: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Candilyzer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Candilyzer failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .candilyzer.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize models, endpoints and search domains.");
    println!("   API keys are never read from this file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so terminal reports on stdout stay clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command {
        Command::Serve { .. } => {
            println!("🌐 Starting Candilyzer web UI...");
            println!("   Models: {} / {}", config.model.multi_model, config.model.single_model);
            println!("   Open http://{}:{}", config.server.host, config.server.port);
            server::serve(&config).await?;
            Ok(0)
        }
        Command::Multi {
            ref role,
            ref users,
            ref users_file,
            ref credentials,
        } => {
            let form = cli::multi_form(role, users, users_file.as_ref())?;
            run_terminal(&config, credentials.to_credential_set(), AnalysisForm::Multi(form)).await
        }
        Command::Single {
            ref user,
            ref role,
            ref linkedin,
            ref credentials,
        } => {
            let form = cli::single_form(user, role, linkedin.as_deref());
            run_terminal(&config, credentials.to_credential_set(), AnalysisForm::Single(form)).await
        }
        Command::InitConfig => Ok(0),
    }
}

/// Run one analysis and print it as it streams. Returns the exit code.
async fn run_terminal(config: &Config, credentials: CredentialSet, form: AnalysisForm) -> Result<i32> {
    let agent = CandidateAgent::new(AgentConfig::from_config(config)).context("Failed to initialize agent")?;

    let updates = match analysis::start(&agent, &credentials, &form) {
        Ok(updates) => updates,
        Err(e) => {
            eprintln!("⚠️  {}", e);
            if let ValidationError::MissingCredentials(missing) = &e {
                for kind in missing {
                    eprintln!("   Missing: {}", kind.label());
                }
                eprintln!("   Pass them as flags or set DEEPSEEK_API_KEY, GITHUB_TOKEN and EXA_API_KEY.");
            }
            return Ok(EXIT_INVALID);
        }
    };

    let model = match form.kind() {
        AnalysisKind::Multi => &config.model.multi_model,
        AnalysisKind::Single => &config.model.single_model,
    };
    println!("🔎 {}", form.kind());
    println!("   Model: {}", model);
    println!();

    tokio::select! {
        code = print_updates(updates) => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; abandoning analysis");
            eprintln!("\n⛔ Interrupted.");
            Ok(EXIT_INTERRUPTED)
        }
    }
}

async fn print_updates(mut updates: futures::stream::BoxStream<'static, AnalysisUpdate>) -> Result<i32> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.set_message("Evaluation in progress...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut stdout = std::io::stdout();

    while let Some(update) = updates.next().await {
        match update {
            AnalysisUpdate::Tool { name, .. } => {
                if spinner.is_finished() {
                    debug!("Tool call after output started: {}", name);
                } else {
                    spinner.set_message(format!("Running {}...", name));
                }
            }
            AnalysisUpdate::Fragment { text, .. } => {
                if !spinner.is_finished() {
                    spinner.finish_and_clear();
                }
                write!(stdout, "{}", text).context("Failed to write output")?;
                stdout.flush().context("Failed to write output")?;
            }
            AnalysisUpdate::Finished(outcome) => {
                spinner.finish_and_clear();
                println!("\n");
                match outcome.score {
                    Some(score) => println!("✅ Score: {}/100", score),
                    None => println!("⚠️  No score found in the report."),
                }
                println!(
                    "   Completed in {:.1}s ({} tool calls)",
                    outcome.duration_seconds, outcome.tool_calls
                );
                return Ok(0);
            }
            AnalysisUpdate::Failed { message } => {
                spinner.finish_and_clear();
                eprintln!("\n❌ Error: {}", message);
                return Ok(1);
            }
        }
    }

    spinner.finish_and_clear();
    Ok(1)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
