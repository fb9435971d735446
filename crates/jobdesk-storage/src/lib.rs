//! File intake for application attachments.
//!
//! Uploaded files are written to a staging root before the owning
//! applicant is known, then relocated into a per-applicant directory once
//! the database has issued an identifier. When the staging root is a
//! credentialed network share, the [`ShareMounter`] capability manages the
//! connection lifecycle around the workflow.

pub mod intake;
pub mod share;

pub use intake::{files_metadata_json, FileIntake, FinalFile, IntakeError, StagedFile};
pub use share::{connect_with_retry, LocalMount, RemoteMount, ShareError, ShareMounter};
