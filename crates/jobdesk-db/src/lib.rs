//! Persistence gateway for named stored operations.
//!
//! Every database interaction in jobdesk goes through the
//! [`PersistenceGateway`] trait: callers name an operation, hand over typed
//! input parameters, and declare the output parameters they expect back.
//! No other crate writes SQL.

pub mod gateway;
pub mod normalize;
pub mod ops;
pub mod params;

pub use gateway::{CallResult, OutputValues, PersistenceError, PersistenceGateway, PgGateway};
pub use normalize::{list_params, normalize_payload, NormalizeError};
pub use ops::{StaffContact, StoredUser, SubmissionRecord, WorkflowStore};
pub use params::{OutputKind, OutputSpec, ParamValue};
