//! Core types shared across the crate.
//!
//! - **Errors**: the crate error enum with thiserror derives
//! - **Config**: codec and observability configuration

mod config;
mod errors;

pub use config::{
    CodecConfig, Config, ObservabilityConfig, ENV_JSON_DEPTH, ENV_JSON_PRETTY, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL,
};
pub use errors::{Error, Result};
