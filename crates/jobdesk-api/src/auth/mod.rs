//! Admin login.
//!
//! Two credential sources, tried in order: the stored admin table, then the
//! corporate directory. Stored hashes are bcrypt for accounts created after
//! the password-scheme migration and hex-encoded SHA-256 for legacy rows;
//! the hash prefix picks the verifier.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use jobdesk_core::AppError;
use jobdesk_db::WorkflowStore;

/// Corporate directory seam (LDAP in deployment). `user_exists` backs the
/// bypass path, which must confirm the username independently of the
/// shared secret.
#[async_trait]
pub trait DirectoryAuthenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> bool;
    async fn user_exists(&self, username: &str) -> bool;
}

/// Directory used when none is configured: every lookup fails, so only
/// stored credentials can log in.
pub struct DenyAllDirectory;

#[async_trait]
impl DirectoryAuthenticator for DenyAllDirectory {
    async fn authenticate(&self, _username: &str, _password: &str) -> bool {
        false
    }

    async fn user_exists(&self, _username: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub username: String,
    pub user_id: i32,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_consent: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    store: WorkflowStore,
    directory: Arc<dyn DirectoryAuthenticator>,
    bypass_enabled: bool,
}

impl AuthService {
    pub fn new(
        store: WorkflowStore,
        directory: Arc<dyn DirectoryAuthenticator>,
        bypass_enabled: bool,
    ) -> Self {
        Self {
            store,
            directory,
            bypass_enabled,
        }
    }

    /// Authenticate against stored credentials first, then the directory.
    /// Returns `None` when both reject; persistence failures propagate.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, AppError> {
        if let Some(user) = self.store.stored_user_by_email(username).await? {
            if verify_password(password, &user.password_hash) {
                return Ok(Some(AuthenticatedUser {
                    username: user.email,
                    user_id: user.user_id,
                    role: "User".to_string(),
                    confirm_consent: user.confirm_consent,
                }));
            }
        }

        if self.directory_authenticate(username, password).await? {
            return Ok(Some(AuthenticatedUser {
                username: username.to_string(),
                user_id: 0,
                role: "Directory".to_string(),
                confirm_consent: None,
            }));
        }

        Ok(None)
    }

    /// Directory login with the bypass escape hatch in front: when enabled
    /// and the supplied password matches the provisioned shared secret, the
    /// login succeeds without a directory bind, but only for usernames the
    /// directory confirms exist. A secret match that fails the existence
    /// check is a hard reject, not a fall-through to a normal bind.
    async fn directory_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        if self.bypass_enabled {
            if let Some(secret) = self.store.directory_bypass_secret().await? {
                if !secret.is_empty() && password == secret {
                    if self.directory.user_exists(username).await {
                        warn!(username = %username, "Directory authentication bypassed");
                        return Ok(true);
                    }
                    warn!(
                        username = %username,
                        "Directory bypass rejected: user not found in directory"
                    );
                    return Ok(false);
                }
            }
        }

        Ok(self.directory.authenticate(username, password).await)
    }
}

/// Hash-prefix dispatch: bcrypt hashes start with "$2"; anything else is a
/// legacy hex-encoded SHA-256 digest.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if stored_hash.starts_with("$2") {
        bcrypt::verify(password, stored_hash).unwrap_or(false)
    } else {
        verify_legacy_sha256(password, stored_hash)
    }
}

fn verify_legacy_sha256(password: &str, stored_hash: &str) -> bool {
    let digest = hex::encode(Sha256::digest(password.as_bytes()));
    digest.eq_ignore_ascii_case(stored_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdesk_db::{
        CallResult, OutputSpec, ParamValue, PersistenceError, PersistenceGateway,
    };
    use serde_json::{json, Map, Value};

    #[test]
    fn bcrypt_hashes_are_verified_with_bcrypt() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn legacy_hashes_are_verified_with_sha256() {
        // SHA-256("password"), uppercase hex as the legacy importer stored it.
        let legacy = "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8";
        assert!(verify_password("password", legacy));
        assert!(!verify_password("Password", legacy));
    }

    struct CannedGateway {
        user_rows: Vec<Value>,
        bypass_secret: Option<String>,
    }

    #[async_trait]
    impl PersistenceGateway for CannedGateway {
        async fn invoke(
            &self,
            operation: &str,
            _inputs: &[(String, ParamValue)],
            _outputs: &[OutputSpec],
        ) -> Result<CallResult, PersistenceError> {
            let rows: Vec<Map<String, Value>> = match operation {
                "get_admin_user_by_email" => self.user_rows.clone(),
                "get_directory_bypass_secret" => self
                    .bypass_secret
                    .iter()
                    .map(|s| json!({"DecryptedPassword": s}))
                    .collect(),
                other => panic!("unexpected operation {other}"),
            }
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("rows must be objects"),
            })
            .collect();
            Ok(CallResult {
                outputs: Default::default(),
                rows,
            })
        }
    }

    struct ScriptedDirectory {
        exists: bool,
        accepts: bool,
    }

    #[async_trait]
    impl DirectoryAuthenticator for ScriptedDirectory {
        async fn authenticate(&self, _username: &str, _password: &str) -> bool {
            self.accepts
        }

        async fn user_exists(&self, _username: &str) -> bool {
            self.exists
        }
    }

    fn service(
        user_rows: Vec<Value>,
        bypass_secret: Option<&str>,
        directory: ScriptedDirectory,
        bypass_enabled: bool,
    ) -> AuthService {
        let gateway = Arc::new(CannedGateway {
            user_rows,
            bypass_secret: bypass_secret.map(str::to_string),
        });
        AuthService::new(
            WorkflowStore::new(gateway),
            Arc::new(directory),
            bypass_enabled,
        )
    }

    fn stored_user_row(password_hash: &str) -> Value {
        json!({
            "UserId": 9,
            "Email": "admin@example.com",
            "PasswordHash": password_hash,
            "ConfirmConsent": "Y",
        })
    }

    #[tokio::test]
    async fn stored_credentials_win_over_directory() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        let auth = service(
            vec![stored_user_row(&hash)],
            None,
            ScriptedDirectory {
                exists: false,
                accepts: false,
            },
            false,
        );

        let user = auth
            .authenticate("admin@example.com", "s3cret")
            .await
            .unwrap()
            .expect("stored login should succeed");
        assert_eq!(user.user_id, 9);
        assert_eq!(user.role, "User");
        assert_eq!(user.confirm_consent.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn wrong_stored_password_falls_through_to_directory() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        let auth = service(
            vec![stored_user_row(&hash)],
            None,
            ScriptedDirectory {
                exists: true,
                accepts: true,
            },
            false,
        );

        let user = auth
            .authenticate("admin@example.com", "directory-password")
            .await
            .unwrap()
            .expect("directory login should succeed");
        assert_eq!(user.user_id, 0);
        assert_eq!(user.role, "Directory");
    }

    #[tokio::test]
    async fn bypass_requires_the_flag() {
        let auth = service(
            vec![],
            Some("shared-secret"),
            ScriptedDirectory {
                exists: true,
                accepts: false,
            },
            false,
        );

        let user = auth.authenticate("someone", "shared-secret").await.unwrap();
        assert!(user.is_none(), "bypass must be inert when disabled");
    }

    #[tokio::test]
    async fn bypass_requires_directory_membership() {
        let auth = service(
            vec![],
            Some("shared-secret"),
            ScriptedDirectory {
                exists: false,
                accepts: true,
            },
            true,
        );

        let user = auth.authenticate("ghost", "shared-secret").await.unwrap();
        assert!(
            user.is_none(),
            "secret match without directory membership must reject"
        );
    }

    #[tokio::test]
    async fn bypass_accepts_known_user_with_secret() {
        let auth = service(
            vec![],
            Some("shared-secret"),
            ScriptedDirectory {
                exists: true,
                accepts: false,
            },
            true,
        );

        let user = auth
            .authenticate("someone", "shared-secret")
            .await
            .unwrap()
            .expect("bypass should authenticate existing user");
        assert_eq!(user.role, "Directory");
    }
}
