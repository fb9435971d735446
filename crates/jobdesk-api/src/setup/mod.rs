//! Application setup and initialization
//!
//! All wiring lives here so main.rs stays a thin entry point and tests can
//! assemble the same state with substituted collaborators.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;

use jobdesk_core::constants::SUBMISSION_ALLOWED_EXTENSIONS;
use jobdesk_core::Config;
use jobdesk_db::{PgGateway, WorkflowStore};
use jobdesk_storage::{FileIntake, LocalMount, RemoteMount, ShareMounter};

use crate::auth::{AuthService, DenyAllDirectory};
use crate::services::{EmailSender, NoopEmailSender, SmtpEmailSender};
use crate::state::AppState;

/// Initialize the entire application: database, storage, services, routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let config = Arc::new(config);

    let pool = database::setup_database(&config).await?;
    let store = WorkflowStore::new(Arc::new(PgGateway::new(pool.clone())));

    let intake = Arc::new(
        FileIntake::new(config.storage_root.clone(), SUBMISSION_ALLOWED_EXTENSIONS).await?,
    );
    let mounter = setup_mounter(&config);

    let mailer: Arc<dyn EmailSender> = match SmtpEmailSender::from_config(&config) {
        Some(sender) => Arc::new(sender),
        None => {
            tracing::warn!("SMTP not configured, notifications will be dropped");
            Arc::new(NoopEmailSender)
        }
    };

    // No directory servers are wired in this deployment shape; stored
    // credentials are the only interactive login path. The bypass flag
    // still gates a DenyAllDirectory, so it stays inert here.
    let auth = AuthService::new(
        store.clone(),
        Arc::new(DenyAllDirectory),
        config.directory_bypass_enabled,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db_pool: pool,
        store,
        intake,
        mounter,
        mailer,
        auth,
    });

    let router = routes::setup_routes(&config, state.clone());
    Ok((state, router))
}

fn setup_mounter(config: &Config) -> Arc<dyn ShareMounter> {
    if config.use_remote_share() {
        tracing::info!(
            remote = %config.share_remote_path.as_deref().unwrap_or_default(),
            "storage root is a credentialed network share"
        );
        Arc::new(RemoteMount::new(
            config.share_remote_path.clone().unwrap_or_default(),
            config.share_username.clone().unwrap_or_default(),
            config.share_password.clone().unwrap_or_default(),
            config.storage_root.clone(),
            config.share_mount_cmd.clone().unwrap_or_default(),
            config.share_unmount_cmd.clone().unwrap_or_default(),
        ))
    } else {
        Arc::new(LocalMount::new(config.storage_root.clone()))
    }
}
