pub mod check;
pub mod fmt;
pub mod generate;
pub mod links;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "xcfg")]
#[command(about = "Validate, format and convert Xray JSON configurations", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pre-flight checks on a document
    Check(check::CheckArgs),
    /// Re-emit a document as pretty JSON
    Fmt(fmt::FmtArgs),
    /// 分享链接导入/导出
    Links(links::LinksArgs),
    /// Generate UUIDs, REALITY keys and short ids
    Generate(generate::GenerateArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}
