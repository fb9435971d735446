//! Core types shared across the jobdesk workspace: configuration,
//! the unified error type, and workflow constants.

pub mod config;
pub mod constants;
pub mod error;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
