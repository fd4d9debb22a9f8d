//! xc-types: cross-crate stable contracts (issue codes, severities, field issues).
//!
//! Every validator in the workspace reports problems as [`FieldIssue`] values.
//! The UI / CLI decides how to render them; the pre-flight gate only looks at
//! [`Severity`].
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable issue codes used by record validation, duplicate detection and the CLI.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // ----- Validation -----
    MissingRequired,
    InvalidAddress,
    InvalidPort,
    InvalidUuid,
    InvalidEnum,
    /// A known key holds a JSON value of the wrong type.
    InvalidType,
    Conflict,
    // ----- Cross-reference -----
    DuplicateTag,
    UnknownReference,
    EmptySelector,
    // ----- Transport security -----
    RealityMissingKey,
    RealityShortId,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        use IssueCode::*;
        match self {
            MissingRequired => "MISSING_REQUIRED",
            InvalidAddress => "INVALID_ADDRESS",
            InvalidPort => "INVALID_PORT",
            InvalidUuid => "INVALID_UUID",
            InvalidEnum => "INVALID_ENUM",
            InvalidType => "INVALID_TYPE",
            Conflict => "CONFLICT",
            DuplicateTag => "DUPLICATE_TAG",
            UnknownReference => "UNKNOWN_REFERENCE",
            EmptySelector => "EMPTY_SELECTOR",
            RealityMissingKey => "REALITY_MISSING_KEY",
            RealityShortId => "REALITY_SHORT_ID",
        }
    }
}

impl Display for IssueCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bad an issue is.
///
/// `Fatal` marks conditions the proxy engine is known to crash on; any
/// synchronization to a live process must refuse while one is present.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-tagged validation finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Field the message is attached to (`tag`, `port`, `selector`, ...).
    pub field: String,
    pub code: IssueCode,
    pub severity: Severity,
    pub message: String,
}

impl FieldIssue {
    pub fn error(field: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn fatal(field: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            severity: Severity::Fatal,
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.field, self.message)
    }
}
