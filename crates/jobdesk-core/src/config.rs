//! Configuration module
//!
//! All settings come from environment variables, read once at startup into
//! a `Config`. Validation is fail-fast: a misconfigured deployment should
//! never reach the point of accepting requests.

use std::env;

use crate::error::AppError;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // File storage: local root, or a credentialed remote share
    pub storage_root: String,
    pub share_remote_path: Option<String>,
    pub share_username: Option<String>,
    pub share_password: Option<String>,
    pub share_mount_cmd: Option<String>,
    pub share_unmount_cmd: Option<String>,
    // Links embedded in notification bodies
    pub application_form_url: String,
    pub candidate_login_url: Option<String>,
    pub admin_login_url: Option<String>,
    // SMTP
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    // Directory (LDAP-equivalent) login fallback.
    // The bypass shared secret lets any username that exists in the
    // directory authenticate with one password fetched from the store.
    // Security-sensitive; off unless explicitly enabled.
    pub directory_bypass_enabled: bool,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        let config = Config {
            environment: env_or("ENVIRONMENT", "development"),
            server_port: parse_env("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database_url: required_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            storage_root: required_env("STORAGE_ROOT")?,
            share_remote_path: optional_env("SHARE_REMOTE_PATH"),
            share_username: optional_env("SHARE_USERNAME"),
            share_password: optional_env("SHARE_PASSWORD"),
            share_mount_cmd: optional_env("SHARE_MOUNT_CMD"),
            share_unmount_cmd: optional_env("SHARE_UNMOUNT_CMD"),
            application_form_url: required_env("APPLICATION_FORM_URL")?,
            candidate_login_url: optional_env("CANDIDATE_LOGIN_URL"),
            admin_login_url: optional_env("ADMIN_LOGIN_URL"),
            smtp_host: optional_env("SMTP_HOST"),
            smtp_port: parse_env("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            smtp_user: optional_env("SMTP_USER"),
            smtp_password: optional_env("SMTP_PASSWORD"),
            smtp_from: optional_env("SMTP_FROM"),
            smtp_tls: bool_env("SMTP_TLS", true),
            directory_bypass_enabled: bool_env("DIRECTORY_BYPASS_ENABLED", false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast consistency checks.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.use_remote_share() && self.share_username.is_none() {
            return Err(AppError::Validation(
                "SHARE_REMOTE_PATH is set but SHARE_USERNAME is missing".to_string(),
            ));
        }
        if self.use_remote_share() && self.share_password.is_none() {
            return Err(AppError::Validation(
                "SHARE_REMOTE_PATH is set but SHARE_PASSWORD is missing".to_string(),
            ));
        }
        if self.smtp_host.is_some() && self.smtp_from.is_none() {
            return Err(AppError::Validation(
                "SMTP_HOST is set but SMTP_FROM is missing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Whether staged files live on a credentialed remote share rather than
    /// local disk. Production deployments mount the share out-of-band and
    /// run with a plain local root.
    pub fn use_remote_share(&self) -> bool {
        !self.is_production() && self.share_remote_path.is_some()
    }

    /// Whether an SMTP transport can be built from this configuration.
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_from.is_some()
    }

    /// Link used in candidate result notifications; falls back to the
    /// application form when no dedicated login URL is configured.
    pub fn candidate_link(&self) -> &str {
        self.candidate_login_url
            .as_deref()
            .unwrap_or(&self.application_form_url)
    }

    /// Link used in hire requests asking staff to respond in the admin
    /// screen; falls back to the application form.
    pub fn admin_link(&self) -> &str {
        self.admin_login_url
            .as_deref()
            .unwrap_or(&self.application_form_url)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn required_env(key: &str) -> Result<String, AppError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} must be set", key)))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

fn bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}
