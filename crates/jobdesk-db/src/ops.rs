//! Typed wrappers for the named stored operations the workflows invoke.
//!
//! Each method assembles the operation's parameter set, declares its output
//! parameters, and maps the result into a plain struct. The store itself
//! stays an opaque collaborator behind [`PersistenceGateway`].

use std::sync::Arc;

use serde_json::{Map, Value};

use jobdesk_core::AppError;

use crate::gateway::{PersistenceError, PersistenceGateway};
use crate::normalize::{list_params, normalize_payload};
use crate::params::{OutputSpec, ParamValue};

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<crate::normalize::NormalizeError> for AppError {
    fn from(err: crate::normalize::NormalizeError) -> Self {
        AppError::InvalidPayload(err.to_string())
    }
}

/// Denormalized result of the transactional submission insert.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRecord {
    pub applicant_id: Option<i32>,
    pub applicant_email: String,
    pub hr_manager_emails: String,
    pub job_manager_emails: String,
    pub job_title: String,
    pub company_name: String,
}

impl SubmissionRecord {
    /// Staff recipients for the new-candidate notice: HR list ∪ manager
    /// list, comma-split, trimmed, blanks dropped, deduplicated in order.
    pub fn staff_recipients(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for email in format!("{},{}", self.hr_manager_emails, self.job_manager_emails)
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            if !seen.iter().any(|s| s == email) {
                seen.push(email.to_string());
            }
        }
        seen
    }
}

/// One HR staff row from the recipient query. Rows with blank emails are
/// dropped at this layer.
#[derive(Debug, Clone)]
pub struct StaffContact {
    pub email: String,
    pub name_thai: String,
    pub tel_off: String,
}

/// Stored admin user, as returned by the login lookup.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user_id: i32,
    pub email: String,
    pub password_hash: String,
    pub confirm_consent: Option<String>,
}

/// Gateway-backed access to every stored operation the workflows use.
#[derive(Clone)]
pub struct WorkflowStore {
    gateway: Arc<dyn PersistenceGateway>,
}

impl WorkflowStore {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Persist a submission transactionally and return the applicant id
    /// plus the denormalized fields notification dispatch needs.
    #[tracing::instrument(skip(self, payload, files_json), fields(job_id = job_id))]
    pub async fn insert_application(
        &self,
        payload: &Map<String, Value>,
        job_id: i32,
        files_json: &str,
    ) -> Result<SubmissionRecord, AppError> {
        let mut params = normalize_payload(payload)?;
        for (key, value) in list_params(payload) {
            upsert(&mut params, key, value);
        }
        upsert(
            &mut params,
            "JsonInput".to_string(),
            ParamValue::raw(Value::Object(payload.clone()).to_string()),
        );
        upsert(
            &mut params,
            "FilesList".to_string(),
            ParamValue::raw(files_json),
        );
        upsert(&mut params, "JobID".to_string(), ParamValue::Int(job_id));

        let outputs = [
            OutputSpec::int("ApplicantID"),
            OutputSpec::text("ApplicantEmail", 100),
            OutputSpec::text("HRManagerEmails", 500),
            OutputSpec::text("JobManagerEmails", 500),
            OutputSpec::text("JobTitle", 200),
            OutputSpec::text("CompanyName", 200),
        ];

        let result = self
            .gateway
            .invoke("insert_applicant_data", &params, &outputs)
            .await?;

        Ok(SubmissionRecord {
            applicant_id: result.outputs.int("ApplicantID"),
            applicant_email: result.outputs.text("ApplicantEmail").unwrap_or_default(),
            hr_manager_emails: result.outputs.text("HRManagerEmails").unwrap_or_default(),
            job_manager_emails: result.outputs.text("JobManagerEmails").unwrap_or_default(),
            job_title: result.outputs.text("JobTitle").unwrap_or_default(),
            company_name: result.outputs.text("CompanyName").unwrap_or_default(),
        })
    }

    /// Staff recipients filtered by role code and optional department.
    pub async fn staff_emails(
        &self,
        role: i32,
        department: Option<&str>,
    ) -> Result<Vec<StaffContact>, AppError> {
        let params = vec![
            ("Role".to_string(), ParamValue::Int(role)),
            (
                "Department".to_string(),
                department.map_or(ParamValue::Null, ParamValue::text),
            ),
        ];

        let result = self.gateway.invoke("get_staff_emails", &params, &[]).await?;

        Ok(result
            .rows
            .iter()
            .filter_map(|row| {
                let email = row_text(row, "EMAIL")?.trim().to_string();
                if email.is_empty() {
                    return None;
                }
                Some(StaffContact {
                    email,
                    name_thai: row_text(row, "NAMETHAI").unwrap_or_default(),
                    tel_off: row_text(row, "TELOFF").unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Update an application's persisted status. The remark only rides
    /// along when it carries content.
    #[tracing::instrument(skip(self, remark), fields(applicant_id = applicant_id))]
    pub async fn update_applicant_status(
        &self,
        applicant_id: i32,
        status: &str,
        remark: Option<&str>,
    ) -> Result<(), AppError> {
        let mut params = vec![
            ("ApplicantID".to_string(), ParamValue::Int(applicant_id)),
            ("Status".to_string(), ParamValue::text(status)),
        ];
        if let Some(remark) = remark.filter(|r| !r.trim().is_empty()) {
            params.push(("Remark".to_string(), ParamValue::text(remark)));
        }

        self.gateway
            .invoke("update_applicant_status", &params, &[])
            .await?;
        Ok(())
    }

    /// Update a job posting's approval status.
    #[tracing::instrument(skip(self, remark), fields(job_id = job_id))]
    pub async fn update_job_approval(
        &self,
        job_id: i32,
        approval_status: &str,
        remark: Option<&str>,
    ) -> Result<(), AppError> {
        let params = vec![
            ("JobID".to_string(), ParamValue::Int(job_id)),
            ("ApprovalStatus".to_string(), ParamValue::text(approval_status)),
            (
                "Remark".to_string(),
                remark.map_or(ParamValue::Null, ParamValue::text),
            ),
        ];

        self.gateway
            .invoke("update_job_approval", &params, &[])
            .await?;
        Ok(())
    }

    /// Stored admin user by email, if any.
    pub async fn stored_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, AppError> {
        let params = vec![("Email".to_string(), ParamValue::text(email))];
        let result = self
            .gateway
            .invoke("get_admin_user_by_email", &params, &[])
            .await?;

        Ok(result.rows.first().and_then(|row| {
            Some(StoredUser {
                user_id: row_int(row, "UserId")?,
                email: row_text(row, "Email")?,
                password_hash: row_text(row, "PasswordHash")?,
                confirm_consent: row_text(row, "ConfirmConsent"),
            })
        }))
    }

    /// Current directory bypass shared secret, when one is provisioned.
    pub async fn directory_bypass_secret(&self) -> Result<Option<String>, AppError> {
        let result = self
            .gateway
            .invoke("get_directory_bypass_secret", &[], &[])
            .await?;
        Ok(result
            .rows
            .first()
            .and_then(|row| row_text(row, "DecryptedPassword")))
    }
}

fn upsert(params: &mut Vec<(String, ParamValue)>, key: String, value: ParamValue) {
    if let Some(slot) = params.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        params.push((key, value));
    }
}

fn row_text(row: &Map<String, Value>, key: &str) -> Option<String> {
    let wanted = key.to_lowercase();
    row.iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .and_then(|(_, v)| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn row_int(row: &Map<String, Value>, key: &str) -> Option<i32> {
    let wanted = key.to_lowercase();
    row.iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .and_then(|(_, v)| match v {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
}
