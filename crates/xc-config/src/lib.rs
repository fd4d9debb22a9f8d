//! Configuration model and validation for xcfg
//! xcfg 的配置模型与校验
//!
//! # Global Strategic Logic / 全局战略逻辑
//! This crate is the **consistency engine** behind the editor. The UI owns
//! the mutable [`Document`]; everything here is a pure function over a slice
//! of it, returning new values or issue lists.
//! 本 crate 是编辑器背后的 **一致性引擎**。
//!
//! ## Workflow / 工作流
//! `JSON text` -> [`Document::from_json`] -> edit -> [`validator`] per record
//! -> [`preflight`] for the whole document -> [`sync::push_profile`] (gated).
//!
//! ## Key Modules / 关键模块
//! - [`address`]: address / port / UUID predicates.
//! - [`layout`]: the three historical settings layouts and their normalization.
//! - [`validator`]: inbound / outbound / balancer / routing-rule checks.
//! - [`identity`]: identity keys and duplicate detection.
//! - [`preflight`]: the push gate.
//! - [`sync`]: remote profile port.

use thiserror::Error;

pub mod address;
pub mod identity;
pub mod layout;
mod lenient;
pub mod model;
pub mod preflight;
pub mod sync;
pub mod validator;

pub use address::{
    is_valid_address, is_valid_domain_name, is_valid_ip_address, is_valid_port, is_valid_uuid,
};
pub use identity::{
    balancer_members, find_duplicate_balancer_tags, find_duplicate_outbound, find_duplicate_tags,
    identity_key_of,
};
pub use layout::{resolve_endpoint, Endpoint, ServerLayout};
pub use model::{
    Balancer, Document, InboundRecord, Network, OutboundRecord, PortValue, Protocol, Routing,
    RoutingRule, Security, StreamSettings,
};
pub use preflight::{preflight, DocumentIssue, PreflightReport};
pub use validator::{
    validate_balancer_record, validate_inbound_record, validate_outbound_record,
    validate_routing_rule,
};
pub use xc_types::{FieldIssue, IssueCode, Severity};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}
