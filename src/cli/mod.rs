pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod export;
pub mod ingest;
pub mod log;
pub mod output;
pub mod record;
pub mod runtime;
pub mod script;
pub mod selector;
pub mod session;

pub use app::run;
pub use context::CliContext;
