//! Port for the remote control-plane profile API.
//!
//! The transport (HTTP client, auth storage) lives outside this crate. What
//! lives here is the contract every implementation goes through: a push runs
//! the pre-flight gate first and refuses to write while it reports a fatal
//! issue.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::Document;
use crate::preflight::{preflight, PreflightReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub uuid: String,
    pub name: String,
}

/// Remote profile store. Implemented by the application layer.
pub trait ProfileApi {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns a session token.
    fn login(&mut self, username: &str, password: &str) -> Result<String, Self::Error>;
    fn list_profiles(&self) -> Result<Vec<ProfileSummary>, Self::Error>;
    fn get_profile(&self, uuid: &str) -> Result<Document, Self::Error>;
    fn update_profile(&mut self, uuid: &str, doc: &Document) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("push refused: {} fatal issue(s) would crash the proxy core", .0.fatal().count())]
    Blocked(PreflightReport),
    #[error("remote profile api: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn remote<E: std::error::Error + Send + Sync + 'static>(e: E) -> SyncError {
    SyncError::Remote(Box::new(e))
}

/// Validate `doc` and, if nothing fatal is found, write it to profile `uuid`.
///
/// On success the (possibly non-empty, non-fatal) report is returned so the
/// caller can still surface warnings-level errors.
pub fn push_profile<A: ProfileApi>(
    api: &mut A,
    uuid: &str,
    doc: &Document,
) -> Result<PreflightReport, SyncError> {
    let report = preflight(doc);
    if report.is_push_blocked() {
        warn!(
            profile = uuid,
            fatal = report.fatal().count(),
            "refusing to push profile"
        );
        return Err(SyncError::Blocked(report));
    }
    api.update_profile(uuid, doc).map_err(remote)?;
    info!(profile = uuid, issues = report.issues.len(), "profile pushed");
    Ok(report)
}

/// Fetch profile `uuid`. Pulled documents are not validated here; the caller
/// runs the validators once the document is loaded into the editor.
pub fn pull_profile<A: ProfileApi>(api: &A, uuid: &str) -> Result<Document, SyncError> {
    api.get_profile(uuid).map_err(remote)
}
