use std::sync::Arc;

use sqlx::PgPool;

use jobdesk_core::Config;
use jobdesk_db::WorkflowStore;
use jobdesk_storage::{FileIntake, ShareMounter};

use crate::auth::AuthService;
use crate::services::EmailSender;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Kept alongside the gateway for the health check's liveness probe.
    pub db_pool: PgPool,
    pub store: WorkflowStore,
    pub intake: Arc<FileIntake>,
    pub mounter: Arc<dyn ShareMounter>,
    pub mailer: Arc<dyn EmailSender>,
    pub auth: AuthService,
}
