use clap::Args;

use crate::cli::Format;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file path (JSON). Use '-' for stdin.
    #[arg(short = 'c', long = "config")]
    pub config: String,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Treat non-fatal errors as blocking (exit 2)
    #[arg(long)]
    pub strict: bool,
}
