//! Application submission workflow.
//!
//! Order matters: the storage root is connected before any file is staged,
//! the database insert happens before relocation, and notifications go out
//! last. Everything after the insert commits is best-effort; a lost email
//! or a missing staged file must not roll back an accepted application.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use std::time::Duration;

use jobdesk_core::constants::{
    HR_STAFF_ROLE, SHARE_CONNECT_MAX_ATTEMPTS, SHARE_CONNECT_RETRY_DELAY_MS,
};
use jobdesk_core::AppError;
use jobdesk_db::SubmissionRecord;
use jobdesk_storage::{connect_with_retry, files_metadata_json, StagedFile};

use crate::services::notify;
use crate::state::AppState;

/// One file part from the multipart form, already read into memory.
pub struct UploadPart {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    #[serde(rename = "ApplicantID")]
    pub applicant_id: i32,
    #[serde(rename = "Message")]
    pub message: String,
}

/// Run the full submission: connect storage, stage uploads, persist, move
/// files into the applicant directory, notify the applicant and staff.
pub async fn submit_application(
    state: &AppState,
    payload: Map<String, Value>,
    uploads: Vec<UploadPart>,
) -> Result<SubmissionResponse, AppError> {
    let job_id = extract_job_id(&payload)?;

    connect_with_retry(
        state.mounter.as_ref(),
        SHARE_CONNECT_MAX_ATTEMPTS,
        Duration::from_millis(SHARE_CONNECT_RETRY_DELAY_MS),
    )
    .await
    .map_err(|e| AppError::StorageConnectivity(e.to_string()))?;

    // The share stays connected for the rest of the workflow; disconnect on
    // every exit path once we got this far.
    let result = run_connected(state, payload, job_id, uploads).await;
    state.mounter.disconnect().await;
    result
}

async fn run_connected(
    state: &AppState,
    payload: Map<String, Value>,
    job_id: i32,
    uploads: Vec<UploadPart>,
) -> Result<SubmissionResponse, AppError> {
    let staged = stage_uploads(state, uploads).await?;
    let files_json = files_metadata_json(&staged);

    let record = state
        .store
        .insert_application(&payload, job_id, &files_json)
        .await?;

    let applicant_id = match record.applicant_id.filter(|id| *id > 0) {
        Some(id) => id,
        None => {
            warn!(job_id, "persistence returned no applicant id");
            return Err(AppError::Validation(
                "ApplicantID was not generated by the stored operation".to_string(),
            ));
        }
    };

    // Post-commit: the applicant row exists, so file and email trouble is
    // logged rather than surfaced.
    if let Err(e) = state.intake.relocate(applicant_id, &staged).await {
        error!(applicant_id, error = %e, "failed to relocate staged files");
    }

    send_submission_notices(state, &payload, applicant_id, &record).await;

    Ok(SubmissionResponse {
        applicant_id,
        message: "Application and files submitted successfully.".to_string(),
    })
}

fn extract_job_id(payload: &Map<String, Value>) -> Result<i32, AppError> {
    let value = payload
        .get("JobID")
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::Validation("Invalid or missing JobID.".to_string()))?;

    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| AppError::Validation("Invalid or missing JobID.".to_string())),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| AppError::Validation("Invalid or missing JobID.".to_string())),
        _ => Err(AppError::Validation("Invalid or missing JobID.".to_string())),
    }
}

async fn stage_uploads(
    state: &AppState,
    uploads: Vec<UploadPart>,
) -> Result<Vec<StagedFile>, AppError> {
    let mut staged = Vec::with_capacity(uploads.len());
    for part in uploads {
        if part.data.is_empty() {
            warn!(file_name = %part.file_name, "skipping empty file");
            continue;
        }
        let file = state
            .intake
            .validate_and_stage(&part.file_name, &part.content_type, &part.data)
            .await
            .map_err(crate::error::intake_to_app_error)?;
        staged.push(file);
    }
    Ok(staged)
}

/// Acknowledge the applicant and alert hiring staff. Failures are logged
/// per recipient and never propagate.
async fn send_submission_notices(
    state: &AppState,
    payload: &Map<String, Value>,
    applicant_id: i32,
    record: &SubmissionRecord,
) {
    let applicant_name = full_name_thai(payload);
    let job_title = if record.job_title.trim().is_empty() {
        payload
            .get("JobTitle")
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    } else {
        record.job_title.clone()
    };

    if !record.applicant_email.trim().is_empty() {
        // The first HR row signs the acknowledgement; losing the lookup
        // only degrades the signature block.
        let hr_contact = match state.store.staff_emails(HR_STAFF_ROLE, None).await {
            Ok(staff) => staff.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "could not load HR contact for acknowledgement");
                None
            }
        };
        let body = notify::application_received_body(
            &record.company_name,
            &applicant_name,
            &job_title,
            hr_contact.as_ref(),
        );
        if let Err(e) = state
            .mailer
            .send(
                record.applicant_email.trim(),
                notify::SUBJECT_APPLICATION_RECEIVED,
                &body,
            )
            .await
        {
            error!(to = %record.applicant_email, error = %e, "failed to send applicant acknowledgement");
        }
    }

    let staff_body = notify::new_candidate_body(
        &applicant_name,
        &job_title,
        &state.config.application_form_url,
        applicant_id,
    );
    let mut sent = 0usize;
    for recipient in record.staff_recipients() {
        match state
            .mailer
            .send(&recipient, notify::SUBJECT_NEW_CANDIDATE, &staff_body)
            .await
        {
            Ok(()) => sent += 1,
            Err(e) => error!(to = %recipient, error = %e, "failed to send staff notice"),
        }
    }
    info!(applicant_id, sent, "submission notices dispatched");
}

fn full_name_thai(payload: &Map<String, Value>) -> String {
    let first = payload
        .get("FirstNameThai")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let last = payload
        .get("LastNameThai")
        .and_then(Value::as_str)
        .unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}
