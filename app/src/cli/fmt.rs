//! `xcfg fmt`: load a document and re-emit it pretty-printed.
//! Sections the editor does not model are carried through unchanged.

use anyhow::{bail, Result};
use clap::Args;

use crate::config_loader::{write_document, ConfigSource};

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Config file path (JSON). Use '-' for stdin.
    #[arg(short = 'c', long = "config")]
    pub config: String,
    /// Write result back to the source file instead of stdout
    #[arg(short = 'w', long = "write")]
    pub write: bool,
}

pub fn run(args: FmtArgs) -> Result<()> {
    let source = ConfigSource::parse(&args.config);
    let doc = source.load_document()?;
    match (&source, args.write) {
        (ConfigSource::File(path), true) => {
            write_document(path, &doc)?;
            tracing::info!(file = %path.display(), "document rewritten");
        }
        (ConfigSource::Stdin, true) => bail!("--write needs a file path, not stdin"),
        (_, false) => println!("{}", doc.to_json_pretty()?),
    }
    Ok(())
}
