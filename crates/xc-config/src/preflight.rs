//! Pre-flight gate: whole-document validation run before any push to a live
//! proxy process.
//!
//! The report carries every record issue plus cross-record findings
//! (duplicate tags, dangling rule targets, balancers that select nothing).
//! Any [`Severity::Fatal`] issue makes the document push-blocked.

use serde::Serialize;
use tracing::debug;
use xc_types::{FieldIssue, IssueCode, Severity};

use crate::identity::{balancer_members, find_duplicate_balancer_tags, find_duplicate_tags};
use crate::lenient::mistyped_non_null;
use crate::model::Document;
use crate::validator::{
    validate_balancer_record, validate_inbound_record, validate_outbound_record,
    validate_routing_rule,
};

/// A field issue located inside the document by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentIssue {
    pub ptr: String,
    #[serde(flatten)]
    pub issue: FieldIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub issues: Vec<DocumentIssue>,
}

impl PreflightReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_push_blocked(&self) -> bool {
        self.issues.iter().any(|i| i.issue.is_fatal())
    }

    pub fn fatal(&self) -> impl Iterator<Item = &DocumentIssue> {
        self.issues.iter().filter(|i| i.issue.is_fatal())
    }

    pub fn worst(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.issue.severity).max()
    }

    fn extend(&mut self, ptr: String, issues: Vec<FieldIssue>) {
        self.issues
            .extend(issues.into_iter().map(|issue| DocumentIssue {
                ptr: ptr.clone(),
                issue,
            }));
    }
}

/// Sections the proxy core cannot read at all: `"outbounds": {}`,
/// `"routing": []`, `"rules": "direct"`.
fn unreadable_sections(doc: &Document, report: &mut PreflightReport) {
    let unreadable = |key: &str| {
        vec![FieldIssue::fatal(
            key,
            IssueCode::InvalidType,
            format!("{key} has the wrong JSON type"),
        )]
    };
    for key in ["inbounds", "outbounds", "routing"] {
        if mistyped_non_null(&doc.extra, key) {
            report.extend(format!("/{key}"), unreadable(key));
        }
    }
    if let Some(routing) = &doc.routing {
        for key in ["rules", "balancers"] {
            if mistyped_non_null(&routing.extra, key) {
                report.extend(format!("/routing/{key}"), unreadable(key));
            }
        }
    }
}

pub fn preflight(doc: &Document) -> PreflightReport {
    let mut report = PreflightReport::default();
    unreadable_sections(doc, &mut report);

    for (i, ib) in doc.inbounds.iter().enumerate() {
        report.extend(format!("/inbounds/{i}"), validate_inbound_record(ib));
    }
    for (i, ob) in doc.outbounds.iter().enumerate() {
        report.extend(format!("/outbounds/{i}"), validate_outbound_record(ob));
    }
    for (i, rule) in doc.rules().iter().enumerate() {
        report.extend(
            format!("/routing/rules/{i}"),
            validate_routing_rule(rule, &doc.outbounds, doc.balancers()),
        );
    }
    for (i, b) in doc.balancers().iter().enumerate() {
        let ptr = format!("/routing/balancers/{i}");
        let mut issues = validate_balancer_record(b);
        if !b.selector.is_empty() && balancer_members(b, &doc.outbounds).is_empty() {
            issues.push(FieldIssue::error(
                "selector",
                IssueCode::UnknownReference,
                "selector matches no outbound tag",
            ));
        }
        report.extend(ptr, issues);
    }

    let dup_tags = find_duplicate_tags(doc).into_iter().map(|t| {
        FieldIssue::fatal(
            "tag",
            IssueCode::DuplicateTag,
            format!("tag {t:?} is used more than once"),
        )
    });
    report.extend("/".to_string(), dup_tags.collect());

    let dup_balancers = find_duplicate_balancer_tags(doc).into_iter().map(|t| {
        FieldIssue::fatal(
            "tag",
            IssueCode::DuplicateTag,
            format!("balancer tag {t:?} is used more than once"),
        )
    });
    report.extend("/routing/balancers".to_string(), dup_balancers.collect());

    debug!(
        issues = report.issues.len(),
        blocked = report.is_push_blocked(),
        "preflight finished"
    );
    report
}
