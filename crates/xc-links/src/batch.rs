//! Many links at once.

use tracing::{debug, info};
use xc_config::model::OutboundRecord;

use crate::decode::parse_link;
use crate::encode::encode_link;
use crate::b64;

/// Result of a multi-line import: decoded records in input order plus the
/// number of non-blank lines that failed to decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub records: Vec<OutboundRecord>,
    pub failed_count: usize,
}

/// Decode one link per line. Blank lines are skipped and not counted.
pub fn import_batch(text: &str) -> ImportBatch {
    let mut out = ImportBatch::default();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_link(line) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                debug!(line = lineno + 1, error = %e, "skipping undecodable link");
                out.failed_count += 1;
            }
        }
    }
    info!(
        imported = out.records.len(),
        failed = out.failed_count,
        "link import finished"
    );
    out
}

/// Encode every record, dropping those that are not exportable.
pub fn export_batch(records: &[OutboundRecord]) -> String {
    records
        .iter()
        .map(encode_link)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Import a subscription body: either plain links or the whole list base64-encoded.
pub fn import_subscription(body: &str) -> ImportBatch {
    if !body.contains("://") {
        if let Some(decoded) = b64::decode_text(body).filter(|t| t.contains("://")) {
            debug!("subscription body is base64-encoded");
            return import_batch(&decoded);
        }
    }
    import_batch(body)
}
