//! xcfg entrypoint
//! - tracing 初始化（stderr）
//! - 子命令分发；`check` 以退出码报告结果

use app::{cli, logging};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging();

    match args.command {
        cli::Commands::Check(a) => {
            let code = cli::check::run(a)?;
            std::process::exit(code);
        }
        cli::Commands::Fmt(a) => cli::fmt::run(a),
        cli::Commands::Links(a) => cli::links::run(a),
        cli::Commands::Generate(a) => cli::generate::run(a),
    }
}
