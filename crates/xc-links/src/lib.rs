//! Share-link codec for xcfg
//! xcfg 的分享链接编解码
//!
//! # Global Strategic Logic / 全局战略逻辑
//! Converts between outbound records and the one-line share links clients
//! exchange (`vless://`, `vmess://`, `trojan://`, `ss://`). Decoding never
//! panics on bad input: the batch layer counts failures and moves on.
//! 在出站记录与分享链接之间转换；解析失败只计数，不中断批处理。
//!
//! ## Entry points / 入口
//! - [`decode_link`] / [`parse_link`]: one link to one [`OutboundRecord`].
//! - [`encode_link`] / [`try_encode_link`]: one record to one link.
//! - [`import_batch`], [`export_batch`], [`import_subscription`]: many at once.
//!
//! [`OutboundRecord`]: xc_config::OutboundRecord

use thiserror::Error;

mod b64;
pub mod batch;
pub mod decode;
pub mod encode;
mod vmess;

pub use batch::{export_batch, import_batch, import_subscription, ImportBatch};
pub use decode::{decode_link, parse_link};
pub use encode::{encode_link, try_encode_link};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("malformed link: {0}")]
    Malformed(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("link has no host")]
    MissingHost,
    #[error("link has no credential")]
    MissingCredential,
    #[error("invalid vmess payload: {0}")]
    VmessPayload(String),
    #[error("protocol {0:?} has no share-link form")]
    NotExportable(String),
    #[error("record is missing {0}")]
    MissingField(&'static str),
}
