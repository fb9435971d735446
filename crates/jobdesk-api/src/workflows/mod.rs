pub mod submission;
pub mod transition;

pub use submission::{submit_application, SubmissionResponse, UploadPart};
pub use transition::{update_applicant_status, update_job_approval, TransitionRequest};
