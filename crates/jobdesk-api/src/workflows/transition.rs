//! Status transition workflow.
//!
//! The transition-type field picks the notification branch; the branch name
//! comparison is case-sensitive. Every branch except `notiMail` finishes by
//! persisting the new status. Per-recipient send failures are counted and
//! logged but never block that final update.

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use jobdesk_core::constants::HR_STAFF_ROLE;
use jobdesk_core::AppError;

use crate::services::notify::{self, Candidate, NameKeyStyle};
use crate::state::AppState;

pub const STATUS_UPDATED_MESSAGE: &str = "อัปเดตสถานะเรียบร้อย";
pub const JOB_APPROVAL_UPDATED_MESSAGE: &str = "อัปเดตสถานะของงานเรียบร้อย";

/// Parsed status-transition request. Every field beyond the id and status
/// is optional metadata for the notification branches and defaults to "-".
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub applicant_id: i32,
    pub status: String,
    pub type_mail: String,
    pub candidates: Vec<Value>,
    pub requester_mail: String,
    pub requester_name: String,
    pub requester_post: String,
    pub tel: String,
    pub tel_off: String,
    pub department_contact: String,
    pub job_title: String,
    pub remark: Option<String>,
}

impl TransitionRequest {
    pub fn parse(data: &Map<String, Value>) -> Result<Self, AppError> {
        if !data.contains_key("ApplicantID") || !data.contains_key("Status") {
            return Err(AppError::Validation(
                "Missing required fields: ApplicantID or Status".to_string(),
            ));
        }
        let applicant_id_value = data.get("ApplicantID").filter(|v| !v.is_null());
        let status_value = data.get("Status").filter(|v| !v.is_null());
        let (Some(applicant_id_value), Some(status_value)) = (applicant_id_value, status_value)
        else {
            return Err(AppError::Validation(
                "Invalid or null values for ApplicantID or Status".to_string(),
            ));
        };

        let applicant_id = applicant_id_value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok());
        let status = status_value.as_str();
        let (Some(applicant_id), Some(status)) = (applicant_id, status) else {
            return Err(AppError::Validation(
                "ApplicantID must be an integer and Status must be a string".to_string(),
            ));
        };

        Ok(TransitionRequest {
            applicant_id,
            status: status.to_string(),
            type_mail: str_or_dash(data, "TypeMail"),
            candidates: extract_candidates(data),
            requester_mail: str_or_dash(data, "Email"),
            requester_name: str_or_dash(data, "NAMETHAI"),
            requester_post: str_or_dash(data, "POST"),
            tel: str_or_dash(data, "Mobile"),
            tel_off: str_or_dash(data, "TELOFF"),
            department_contact: str_or_dash(data, "NameCon"),
            job_title: str_or_dash(data, "JobTitle"),
            remark: data
                .get("Remark")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    fn parsed_candidates(&self, style: NameKeyStyle) -> Vec<Candidate> {
        self.candidates
            .iter()
            .map(|v| Candidate::from_value(v, style))
            .collect()
    }
}

fn str_or_dash(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Candidates arrive either as a JSON array or as a string holding
/// serialized JSON, depending on the client. Anything unparseable is
/// treated as an empty list, not an error.
fn extract_candidates(data: &Map<String, Value>) -> Vec<Value> {
    match data.get("Candidates") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(raw)) if !raw.is_empty() => {
            match serde_json::from_str::<Vec<Value>>(raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "failed to parse Candidates JSON");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    }
}

/// Dispatch the notification branch, then persist the status (except for
/// the notify-only `notiMail` pseudo-transition).
pub async fn update_applicant_status(
    state: &AppState,
    request: &TransitionRequest,
) -> Result<&'static str, AppError> {
    match request.type_mail.as_str() {
        "Hire" => {
            let sent = send_hire_request(state, request).await?;
            info!(applicant_id = request.applicant_id, sent, "hire request dispatched");
        }
        "Selected" => {
            let sent = send_interview_request(state, request).await?;
            info!(applicant_id = request.applicant_id, sent, "interview request dispatched");
        }
        "notiMail" => {
            send_selection_result(state, request).await;
        }
        _ => {}
    }

    if request.type_mail != "notiMail" {
        state
            .store
            .update_applicant_status(
                request.applicant_id,
                &request.status,
                request.remark.as_deref(),
            )
            .await?;
    }

    Ok(STATUS_UPDATED_MESSAGE)
}

/// Hire: ranked contact list to every HR staff member. The staff lookup is
/// load-bearing and propagates; individual sends are not.
async fn send_hire_request(
    state: &AppState,
    request: &TransitionRequest,
) -> Result<usize, AppError> {
    let candidates = request.parsed_candidates(NameKeyStyle::Pascal);
    let body = notify::hire_request_body(
        &request.department_contact,
        &request.requester_name,
        &request.tel,
        &request.requester_mail,
        &request.job_title,
        &notify::ranked_candidate_lines(&candidates),
        state.config.admin_link(),
    );

    let staff = state.store.staff_emails(HR_STAFF_ROLE, None).await?;
    let mut sent = 0usize;
    for contact in staff {
        match state
            .mailer
            .send(&contact.email, notify::SUBJECT_INTERVIEW_CANDIDATES, &body)
            .await
        {
            Ok(()) => sent += 1,
            Err(e) => error!(to = %contact.email, error = %e, "failed to send hire request"),
        }
    }
    Ok(sent)
}

/// Selected: interview-call summary to every HR staff member.
async fn send_interview_request(
    state: &AppState,
    request: &TransitionRequest,
) -> Result<usize, AppError> {
    let candidates = request.parsed_candidates(NameKeyStyle::Camel);
    let body = notify::interview_request_body(
        &request.job_title,
        candidates.len(),
        &notify::joined_candidate_names(&candidates),
        &request.requester_name,
        &request.requester_post,
        &request.tel,
        &request.tel_off,
        &request.requester_mail,
    );

    let staff = state.store.staff_emails(HR_STAFF_ROLE, None).await?;
    let mut sent = 0usize;
    for contact in staff {
        match state
            .mailer
            .send(&contact.email, notify::SUBJECT_INTERVIEW_CANDIDATES, &body)
            .await
        {
            Ok(()) => sent += 1,
            Err(e) => error!(to = %contact.email, error = %e, "failed to send interview request"),
        }
    }
    Ok(sent)
}

/// notiMail: one result notification to the original requester.
async fn send_selection_result(state: &AppState, request: &TransitionRequest) {
    let body = notify::selection_result_body(
        &request.requester_name,
        &request.job_title,
        state.config.candidate_link(),
    );
    if let Err(e) = state
        .mailer
        .send(&request.requester_mail, notify::SUBJECT_SELECTION_RESULT, &body)
        .await
    {
        error!(to = %request.requester_mail, error = %e, "failed to send selection result");
    }
}

/// Job approval update. `Remark` must be present in the request body but
/// may be null or empty; it is forwarded as-is.
pub async fn update_job_approval(
    state: &AppState,
    data: &Map<String, Value>,
) -> Result<&'static str, AppError> {
    for key in ["JobID", "ApprovalStatus", "Remark"] {
        if !data.contains_key(key) {
            return Err(AppError::Validation(
                "Missing required fields: JobID, ApprovalStatus, or Remark".to_string(),
            ));
        }
    }
    let job_id_value = data.get("JobID").filter(|v| !v.is_null());
    let approval_value = data.get("ApprovalStatus").filter(|v| !v.is_null());
    let (Some(job_id_value), Some(approval_value)) = (job_id_value, approval_value) else {
        return Err(AppError::Validation(
            "Invalid or null values for JobID or ApprovalStatus".to_string(),
        ));
    };

    let job_id = job_id_value.as_i64().and_then(|v| i32::try_from(v).ok());
    let approval_status = approval_value.as_str();
    let (Some(job_id), Some(approval_status)) = (job_id, approval_status) else {
        return Err(AppError::Validation(
            "JobID must be an integer and ApprovalStatus must be a string".to_string(),
        ));
    };
    if job_id == 0 || approval_status.is_empty() {
        return Err(AppError::Validation(
            "Invalid JobID or ApprovalStatus format.".to_string(),
        ));
    }

    let remark = data.get("Remark").and_then(Value::as_str);
    state
        .store
        .update_job_approval(job_id, approval_status, remark)
        .await?;

    Ok(JOB_APPROVAL_UPDATED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parse_requires_id_and_status_keys() {
        let err = TransitionRequest::parse(&map(json!({"Status": "Hired"}))).unwrap_err();
        assert!(err.to_string().contains("Missing required fields"));
    }

    #[test]
    fn parse_rejects_null_values() {
        let err = TransitionRequest::parse(&map(json!({
            "ApplicantID": null,
            "Status": "Hired",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid or null values"));
    }

    #[test]
    fn parse_rejects_wrong_types() {
        let err = TransitionRequest::parse(&map(json!({
            "ApplicantID": "7",
            "Status": "Hired",
        })))
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("ApplicantID must be an integer and Status must be a string"));
    }

    #[test]
    fn parse_defaults_metadata_to_dash() {
        let request = TransitionRequest::parse(&map(json!({
            "ApplicantID": 7,
            "Status": "Hired",
        })))
        .unwrap();
        assert_eq!(request.applicant_id, 7);
        assert_eq!(request.type_mail, "-");
        assert_eq!(request.requester_mail, "-");
        assert!(request.candidates.is_empty());
        assert!(request.remark.is_none());
    }

    #[test]
    fn candidates_accept_array_or_json_string() {
        let from_array = map(json!({
            "ApplicantID": 1,
            "Status": "x",
            "Candidates": [{"title": "นาย"}],
        }));
        assert_eq!(TransitionRequest::parse(&from_array).unwrap().candidates.len(), 1);

        let from_string = map(json!({
            "ApplicantID": 1,
            "Status": "x",
            "Candidates": "[{\"title\": \"นาย\"}, {\"title\": \"นาง\"}]",
        }));
        assert_eq!(TransitionRequest::parse(&from_string).unwrap().candidates.len(), 2);

        let garbage = map(json!({
            "ApplicantID": 1,
            "Status": "x",
            "Candidates": "not json",
        }));
        assert!(TransitionRequest::parse(&garbage).unwrap().candidates.is_empty());
    }
}
