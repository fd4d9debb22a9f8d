//! `xcfg links`: share-link import and export.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use xc_config::{find_duplicate_outbound, Document, OutboundRecord};
use xc_links::{export_batch, import_subscription};

use crate::config_loader::ConfigSource;

#[derive(Args, Debug)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub command: LinksCommands,
}

#[derive(Subcommand, Debug)]
pub enum LinksCommands {
    /// Decode share links (one per line, or a base64 subscription body)
    Import {
        /// Input file. Use '-' for stdin.
        #[arg(short = 'i', long = "input", default_value = "-")]
        input: String,
        /// Append the decoded outbounds to this document and print the result
        #[arg(long = "into")]
        into: Option<PathBuf>,
    },
    /// Print one share link per exportable outbound
    Export {
        /// Config file path (JSON). Use '-' for stdin.
        #[arg(short = 'c', long = "config")]
        config: String,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub appended: usize,
    pub skipped: usize,
}

/// Append `records` to `doc.outbounds`, skipping any whose identity matches an
/// outbound already present (including ones appended earlier in this call).
pub fn merge_records(doc: &mut Document, records: Vec<OutboundRecord>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for record in records {
        if let Some(existing) = find_duplicate_outbound(&record, &doc.outbounds, None) {
            warn!(tag = %record.tag, duplicate_of = %existing, "skipping duplicate outbound");
            outcome.skipped += 1;
            continue;
        }
        doc.outbounds.push(record);
        outcome.appended += 1;
    }
    outcome
}

pub fn run(args: LinksArgs) -> Result<()> {
    match args.command {
        LinksCommands::Import { input, into } => {
            let text = ConfigSource::parse(&input).read_text()?;
            let batch = import_subscription(&text);
            eprintln!(
                "imported {} link(s), {} failed",
                batch.records.len(),
                batch.failed_count
            );
            match into {
                Some(path) => {
                    let source = ConfigSource::File(path);
                    let mut doc = source.load_document()?;
                    if doc.extra.get("outbounds").is_some_and(|v| !v.is_null()) {
                        bail!("{}: outbounds is not an array", source.describe());
                    }
                    let outcome = merge_records(&mut doc, batch.records);
                    info!(
                        appended = outcome.appended,
                        skipped = outcome.skipped,
                        "outbounds merged"
                    );
                    println!("{}", doc.to_json_pretty()?);
                }
                None => println!("{}", serde_json::to_string_pretty(&batch.records)?),
            }
        }
        LinksCommands::Export { config } => {
            let doc = ConfigSource::parse(&config).load_document()?;
            let links = export_batch(&doc.outbounds);
            if !links.is_empty() {
                println!("{links}");
            }
        }
    }
    Ok(())
}
