use clap::{Parser, Subcommand};
use perfinsight_common::{InsightError, Profile};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod analyze;
mod compare;
mod config;
mod loader;
mod output;

/// Exit status of `compare --fail-on-regression` when the candidate regressed
pub const REGRESSION_EXIT_CODE: i32 = 6;

/// Invalid invocation detected after argument parsing
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(pub String);

#[derive(Parser)]
#[command(name = "perfinsight")]
#[command(about = "Analyze and compare performance-test results")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis configuration file (TOML)
    #[arg(short, long, global = true, env = "PERFINSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Threshold profile (default, development, production, testing)
    #[arg(short, long, global = true, value_parser = parse_profile)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single result file
    Analyze(analyze::AnalyzeArgs),
    /// Compare a candidate result file against a baseline
    Compare(compare::CompareArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: config::ConfigCommands,
    },
}

/// Settings shared by every subcommand
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub profile: Option<Profile>,
}

fn parse_profile(value: &str) -> Result<Profile, String> {
    value.parse().map_err(|e: InsightError| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<UsageError>().is_some() {
        return 2;
    }
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<InsightError>())
        .map(|e| e.kind().exit_code())
        .unwrap_or(1)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = GlobalOptions {
        config: cli.config,
        profile: cli.profile,
    };

    let result = match cli.command {
        Commands::Analyze(args) => analyze::handle_command(args, &options).await,
        Commands::Compare(args) => compare::handle_command(args, &options).await,
        Commands::Config { action } => config::handle_command(action, &options).await,
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(exit_code(&e));
        }
    }
}
