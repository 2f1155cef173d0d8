//! SoulRecorder library
//!
//! Exposes modules for integration testing

pub mod cli;
pub mod config;
pub mod render;
pub mod script;

pub use config::Config;
