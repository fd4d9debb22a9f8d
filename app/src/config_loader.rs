//! Document loading for CLI commands
//!
//! # Global Strategic Logic / 全局战略逻辑
//! Every command that reads a document goes through here so `-` (stdin) and
//! file paths behave the same, and errors carry the source in their context.
//! 所有读取文档的命令都经过此处，`-` 表示标准输入。

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use xc_config::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Stdin,
}

impl ConfigSource {
    pub fn parse(arg: &str) -> Self {
        if arg.trim() == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(p) => p.display().to_string(),
            Self::Stdin => "<stdin>".to_string(),
        }
    }

    pub fn read_text(&self) -> Result<String> {
        match self {
            Self::File(p) => {
                std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))
            }
            Self::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("read stdin")?;
                Ok(buf)
            }
        }
    }

    pub fn load_document(&self) -> Result<Document> {
        let text = self.read_text()?;
        Document::from_json(&text).with_context(|| format!("parse {}", self.describe()))
    }
}

/// Write `doc` pretty-printed to `path`, replacing the file atomically.
pub fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let mut text = doc.to_json_pretty()?;
    text.push('\n');
    let tmp = path.with_extension("xcfg.tmp");
    std::fs::write(&tmp, text).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
