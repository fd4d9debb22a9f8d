pub mod args;
pub mod run;
pub mod types;

pub use args::CheckArgs;
pub use run::run;
