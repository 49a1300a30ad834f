pub mod args;
pub mod config;
pub mod loader;
pub mod runner;

pub use args::Args;
pub use config::ConfigFile;
pub use loader::PolicyLoader;
pub use runner::run;
