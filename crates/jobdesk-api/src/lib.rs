//! jobdesk API
//!
//! HTTP surface and orchestration for the application-intake and
//! status-transition workflows.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod workflows;

pub use error::ErrorResponse;
