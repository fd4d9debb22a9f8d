//! Duplicate detection over outbounds and tags.

use std::collections::HashMap;

use crate::layout::resolve_endpoint;
use crate::model::{Document, OutboundRecord};

/// Lowercase `protocol_address:port_credential` key for an outbound.
///
/// `None` when the protocol is unknown or the address/port cannot be resolved;
/// callers must treat that as "comparison skipped", never as a match.
pub fn identity_key_of(record: &OutboundRecord) -> Option<String> {
    let protocol = record.protocol_kind()?;
    let ep = resolve_endpoint(protocol, &record.settings);
    let address = ep.address.as_deref()?;
    let port = ep.port.as_ref()?.as_text();
    let port = port.trim();
    if port.is_empty() {
        return None;
    }
    let credential = ep.credential.as_deref().unwrap_or("");
    Some(format!("{}_{}:{}_{}", protocol.as_str(), address, port, credential).to_lowercase())
}

/// First record in `all` with the same identity as `candidate`, skipping
/// `exclude_index` (the candidate's own slot while it is being edited).
///
/// Returns the matched record's tag, or `Outbound #N` (1-based) when it has none.
pub fn find_duplicate_outbound(
    candidate: &OutboundRecord,
    all: &[OutboundRecord],
    exclude_index: Option<usize>,
) -> Option<String> {
    let key = identity_key_of(candidate)?;
    all.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != exclude_index)
        .find(|(_, other)| identity_key_of(other).as_deref() == Some(key.as_str()))
        .map(|(i, other)| {
            if other.tag.trim().is_empty() {
                format!("Outbound #{}", i + 1)
            } else {
                other.tag.clone()
            }
        })
}

fn duplicates_ci<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    // lowercase -> (first spelling, count)
    let mut seen: HashMap<String, (usize, &'a str, usize)> = HashMap::new();
    for (order, tag) in tags.filter(|t| !t.trim().is_empty()).enumerate() {
        seen.entry(tag.to_lowercase())
            .and_modify(|e| e.2 += 1)
            .or_insert((order, tag, 1));
    }
    let mut dups: Vec<(usize, &str)> = seen
        .into_values()
        .filter(|(_, _, n)| *n > 1)
        .map(|(order, tag, _)| (order, tag))
        .collect();
    dups.sort_unstable_by_key(|(order, _)| *order);
    dups.into_iter().map(|(_, t)| t.to_string()).collect()
}

/// Tags shared (case-insensitively) by more than one inbound/outbound.
///
/// Each duplicate is reported once, spelled as its first occurrence, in
/// document order (inbounds before outbounds). Empty tags are ignored.
pub fn find_duplicate_tags(doc: &Document) -> Vec<String> {
    let inbound = doc.inbounds.iter().map(|r| r.tag.as_str());
    let outbound = doc.outbounds.iter().map(|r| r.tag.as_str());
    duplicates_ci(inbound.chain(outbound))
}

/// Balancer tags shared (case-insensitively) by more than one balancer.
pub fn find_duplicate_balancer_tags(doc: &Document) -> Vec<String> {
    duplicates_ci(doc.balancers().iter().map(|b| b.tag.as_str()))
}

/// Outbound tags a balancer's selector picks up.
pub fn balancer_members<'a>(
    balancer: &crate::model::Balancer,
    outbounds: &'a [OutboundRecord],
) -> Vec<&'a str> {
    outbounds
        .iter()
        .map(|o| o.tag.as_str())
        .filter(|t| balancer.selects(t))
        .collect()
}
