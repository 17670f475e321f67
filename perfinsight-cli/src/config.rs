//! Configuration commands and effective-configuration resolution

use crate::GlobalOptions;
use anyhow::{Context, Result};
use clap::Subcommand;
use perfinsight_common::AnalysisConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write a configuration file with the default (or profile) settings
    Init {
        /// Output file path
        #[arg(short, long, default_value = "perfinsight.toml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Configuration file path to validate
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Build the effective configuration: the config file (or defaults), then
/// the profile's thresholds and throughput floors, then `PERFINSIGHT_*`
/// environment overrides.
pub fn resolve(options: &GlobalOptions) -> Result<AnalysisConfig> {
    let mut config = match &options.config {
        Some(path) => load_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(profile) = options.profile {
        debug!("Applying {:?} threshold profile", profile);
        config.thresholds = profile.thresholds();
        let rules = profile.insight_rules();
        config.insights.warning_throughput_rps = rules.warning_throughput_rps;
        config.insights.critical_throughput_rps = rules.critical_throughput_rps;
    }

    config.apply_env_overrides();
    config.validate().context("Invalid effective configuration")?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<AnalysisConfig> {
    AnalysisConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

pub async fn handle_command(command: ConfigCommands, options: &GlobalOptions) -> Result<i32> {
    match command {
        ConfigCommands::Show => {
            let config = resolve(options)?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Init { output, force } => {
            if output.exists() && !force {
                return Err(crate::UsageError(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                ))
                .into());
            }
            let config = match options.profile {
                Some(profile) => AnalysisConfig::for_profile(profile),
                None => AnalysisConfig::default(),
            };
            config
                .to_file(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Configuration written to: {}", output.display());
        }
        ConfigCommands::Validate { file } => {
            load_file(&file)?;
            println!("Configuration {} is valid", file.display());
        }
    }
    Ok(0)
}
