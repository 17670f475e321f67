//! Report rendering and delivery shared by the analyze and compare commands

use anyhow::{Context, Result};
use perfinsight_analysis::{BuiltinRenderer, Report, ReportFormat, ReportRenderer};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub fn parse_format(value: &str) -> std::result::Result<ReportFormat, String> {
    value.parse().map_err(|e: perfinsight_common::InsightError| e.to_string())
}

/// Render `report` and write it to `output`, or stdout when absent.
pub fn deliver(report: &Report, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let renderer = BuiltinRenderer;
    let bytes = renderer
        .render(report, format)
        .with_context(|| format!("Failed to render {} report", format))?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
            }
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Failed to write report to stdout")?;
            if !bytes.ends_with(b"\n") {
                stdout.write_all(b"\n").context("Failed to write report to stdout")?;
            }
        }
    }

    Ok(())
}

/// Display name for a result file in report titles
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
