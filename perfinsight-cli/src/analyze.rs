//! `analyze` command

use crate::{config, loader, output, GlobalOptions};
use anyhow::{Context, Result};
use clap::Args;
use perfinsight_analysis::{AnalysisEngine, Report, ReportFormat};
use perfinsight_common::RecordFilter;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Result file (.csv or .json)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Report format (json, html, markdown, pdf, excel)
    #[arg(short, long, default_value = "json", value_parser = output::parse_format)]
    pub format: ReportFormat,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only analyze requests to this endpoint (repeatable)
    #[arg(short, long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Largest tolerated fraction of unparseable rows
    #[arg(long)]
    pub max_drop_ratio: Option<f64>,
}

pub async fn handle_command(args: AnalyzeArgs, options: &GlobalOptions) -> Result<i32> {
    let mut config = config::resolve(options)?;
    if let Some(ratio) = args.max_drop_ratio {
        config.normalizer.max_drop_ratio = ratio;
    }
    let engine = AnalysisEngine::new(config).context("Invalid analysis configuration")?;

    let filter = RecordFilter {
        endpoints: (!args.endpoints.is_empty()).then(|| args.endpoints.clone()),
        ..Default::default()
    };

    info!("Analyzing {}", args.input.display());
    let input = args.input.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<_> {
        let table = loader::load_table(&input)?;
        engine
            .analyze_filtered(&table, &filter)
            .with_context(|| format!("Failed to analyze {}", input.display()))
    })
    .await
    .context("Analysis task failed")??;

    let title = format!("Performance Analysis: {}", output::file_label(&args.input));
    output::deliver(&Report::analysis(title, analysis), args.format, args.output.as_deref())?;
    Ok(0)
}
