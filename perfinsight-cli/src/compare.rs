//! `compare` command

use crate::{config, loader, output, GlobalOptions, REGRESSION_EXIT_CODE};
use anyhow::{Context, Result};
use clap::Args;
use perfinsight_analysis::{Analysis, AnalysisEngine, Report, ReportFormat, Verdict};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args)]
pub struct CompareArgs {
    /// Baseline result file (.csv or .json)
    #[arg(short, long)]
    pub baseline: PathBuf,

    /// Candidate result file (.csv or .json)
    #[arg(long)]
    pub candidate: PathBuf,

    /// Report format (json, html, markdown, pdf, excel)
    #[arg(short, long, default_value = "json", value_parser = output::parse_format)]
    pub format: ReportFormat,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with status 6 when the candidate regressed
    #[arg(long)]
    pub fail_on_regression: bool,
}

fn analyze_file(engine: Arc<AnalysisEngine>, path: PathBuf) -> tokio::task::JoinHandle<Result<Analysis>> {
    tokio::task::spawn_blocking(move || {
        let table = loader::load_table(&path)?;
        engine
            .analyze_table(&table)
            .with_context(|| format!("Failed to analyze {}", path.display()))
    })
}

pub async fn handle_command(args: CompareArgs, options: &GlobalOptions) -> Result<i32> {
    let config = config::resolve(options)?;
    let engine = Arc::new(AnalysisEngine::new(config).context("Invalid analysis configuration")?);

    info!(
        "Comparing {} (baseline) with {} (candidate)",
        args.baseline.display(),
        args.candidate.display()
    );

    let (baseline, candidate) = tokio::try_join!(
        analyze_file(Arc::clone(&engine), args.baseline.clone()),
        analyze_file(Arc::clone(&engine), args.candidate.clone()),
    )
    .context("Analysis task failed")?;
    let (baseline, candidate) = (baseline?, candidate?);

    let comparison = engine
        .compare(&baseline, &candidate)
        .context("Failed to compare analyses")?;
    let verdict = comparison.verdict;

    let title = format!(
        "Performance Comparison: {} vs {}",
        output::file_label(&args.baseline),
        output::file_label(&args.candidate)
    );
    output::deliver(&Report::comparison(title, comparison), args.format, args.output.as_deref())?;

    if verdict == Verdict::Regressed && args.fail_on_regression {
        warn!("Candidate regressed against the baseline");
        return Ok(REGRESSION_EXIT_CODE);
    }
    Ok(0)
}
