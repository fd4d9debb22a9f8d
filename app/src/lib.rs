//! xcfg library crate
//! 说明：二进制入口在 `main.rs`，这里导出命令实现供集成测试复用。

pub mod cli;
pub mod config_loader;
pub mod logging;
