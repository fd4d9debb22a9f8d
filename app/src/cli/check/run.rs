use anyhow::{Context, Result};
use tracing::info;

use super::args::CheckArgs;
use super::types::CheckReport;
use crate::cli::Format;
use crate::config_loader::ConfigSource;

/// Main check function - returns exit code (0 = clean, 1 = errors, 2 = fatal)
pub fn run(args: CheckArgs) -> Result<i32> {
    let source = ConfigSource::parse(&args.config);
    let doc = source.load_document()?;
    let report = CheckReport::new(source.describe(), xc_config::preflight(&doc));
    info!(
        file = %report.file,
        errors = report.summary.errors,
        fatal = report.summary.fatal,
        "check finished"
    );
    match args.format {
        Format::Text => println!("{}", report.render_text()),
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize check report")?;
            println!("{json}");
        }
    }
    Ok(report.exit_code(args.strict))
}
