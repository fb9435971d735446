//! Shared test doubles: a scripted persistence gateway, a recording mailer,
//! and an always-connected share mounter, assembled into an `AppState`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;

use jobdesk_api::auth::{AuthService, DenyAllDirectory};
use jobdesk_api::services::EmailSender;
use jobdesk_api::state::AppState;
use jobdesk_core::constants::SUBMISSION_ALLOWED_EXTENSIONS;
use jobdesk_core::Config;
use jobdesk_db::{
    CallResult, OutputSpec, OutputValues, ParamValue, PersistenceError, PersistenceGateway,
    WorkflowStore,
};
use jobdesk_storage::{FileIntake, ShareError, ShareMounter};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: String,
    pub inputs: Vec<(String, ParamValue)>,
}

/// Gateway scripted with one set of rows per operation name. The first row
/// doubles as declared output parameters, mirroring the real gateway.
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Vec<(String, Vec<Map<String, Value>>)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, operation: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("rows must be objects"),
            })
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push((operation.to_string(), rows));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }
}

#[async_trait]
impl PersistenceGateway for FakeGateway {
    async fn invoke(
        &self,
        operation: &str,
        inputs: &[(String, ParamValue)],
        outputs: &[OutputSpec],
    ) -> Result<CallResult, PersistenceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation: operation.to_string(),
            inputs: inputs.to_vec(),
        });

        let mut rows = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(op, _)| op == operation)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();

        let output_values = if !outputs.is_empty() && !rows.is_empty() {
            let first = rows.remove(0);
            OutputValues::from_row(&first, outputs)
        } else {
            OutputValues::default()
        };
        Ok(CallResult {
            outputs: output_values,
            rows,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records every send and can be scripted to fail for specific
/// recipients.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail_for: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.fail_for.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), String> {
        if self.fail_for.lock().unwrap().contains(to) {
            return Err(format!("scripted failure for {}", to));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body_html.to_string(),
        });
        Ok(())
    }
}

/// Mounter that always connects and counts lifecycle calls.
#[derive(Default)]
pub struct AlwaysConnected {
    pub connects: Mutex<u32>,
    pub disconnects: Mutex<u32>,
}

#[async_trait]
impl ShareMounter for AlwaysConnected {
    async fn connect(&self) -> Result<(), ShareError> {
        *self.connects.lock().unwrap() += 1;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.disconnects.lock().unwrap() += 1;
    }
}

pub fn test_config(storage_root: &std::path::Path) -> Config {
    Config {
        environment: "test".to_string(),
        server_port: 0,
        database_url: "postgresql://localhost/jobdesk_test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        storage_root: storage_root.to_string_lossy().into_owned(),
        share_remote_path: None,
        share_username: None,
        share_password: None,
        share_mount_cmd: None,
        share_unmount_cmd: None,
        application_form_url: "https://jobs.example.com/review".to_string(),
        candidate_login_url: Some("https://jobs.example.com/login".to_string()),
        admin_login_url: Some("https://jobs.example.com/admin".to_string()),
        smtp_host: None,
        smtp_port: 587,
        smtp_user: None,
        smtp_password: None,
        smtp_from: None,
        smtp_tls: true,
        directory_bypass_enabled: false,
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub mounter: Arc<AlwaysConnected>,
    // Keeps the staging root alive for the test's duration.
    pub storage_dir: TempDir,
}

/// Assemble an `AppState` around the test doubles. The pool is lazy and
/// never connects; nothing in these tests reaches a real database.
pub async fn test_app() -> TestApp {
    let storage_dir = TempDir::new().expect("temp storage root");
    let config = Arc::new(test_config(storage_dir.path()));

    let gateway = Arc::new(FakeGateway::new());
    let mailer = Arc::new(RecordingMailer::new());
    let mounter = Arc::new(AlwaysConnected::default());

    let store = WorkflowStore::new(gateway.clone() as Arc<dyn PersistenceGateway>);
    let intake = Arc::new(
        FileIntake::new(storage_dir.path(), SUBMISSION_ALLOWED_EXTENSIONS)
            .await
            .expect("file intake"),
    );
    let db_pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let auth = AuthService::new(
        store.clone(),
        Arc::new(DenyAllDirectory),
        config.directory_bypass_enabled,
    );

    let state = Arc::new(AppState {
        config,
        db_pool,
        store,
        intake,
        mounter: mounter.clone(),
        mailer: mailer.clone(),
        auth,
    });

    TestApp {
        state,
        gateway,
        mailer,
        mounter,
        storage_dir,
    }
}
