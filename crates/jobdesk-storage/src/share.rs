//! Storage-root connection lifecycle.
//!
//! The staging root is either a plain local directory or a credentialed
//! network share that must be connected before any write. Platform-specific
//! mount mechanics live behind the [`ShareMounter`] capability;
//! [`connect_with_retry`] owns the retry policy so every implementation
//! inherits it.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The busy / already-connected failure class; the only one retried.
    #[error("share busy: {0}")]
    Busy(String),

    #[error("storage root unavailable: {0}")]
    RootUnavailable(String),

    #[error("share connection failed: {0}")]
    ConnectionFailed(String),
}

impl ShareError {
    pub fn is_busy(&self) -> bool {
        matches!(self, ShareError::Busy(_))
    }
}

/// Connection lifecycle for the storage root.
///
/// Not safe for concurrent use against the same share credentials from
/// multiple in-flight requests; callers serialize externally if that
/// matters for their deployment.
#[async_trait]
pub trait ShareMounter: Send + Sync {
    async fn connect(&self) -> Result<(), ShareError>;

    /// Tear down any existing connection. Best-effort: failures are logged
    /// by implementations, never returned.
    async fn disconnect(&self);
}

/// Connect with a bounded retry on the busy failure class: up to
/// `max_attempts`, fixed `retry_delay`, disconnecting any stale connection
/// before each attempt. Any other failure aborts immediately.
pub async fn connect_with_retry(
    mounter: &dyn ShareMounter,
    max_attempts: u32,
    retry_delay: Duration,
) -> Result<(), ShareError> {
    let mut last_busy = None;
    for attempt in 1..=max_attempts {
        tracing::info!(attempt, max_attempts, "connecting storage root");
        mounter.disconnect().await;
        match mounter.connect().await {
            Ok(()) => {
                tracing::info!(attempt, "storage root connected");
                return Ok(());
            }
            Err(err) if err.is_busy() && attempt < max_attempts => {
                tracing::warn!(attempt, error = %err, "share busy, retrying after delay");
                last_busy = Some(err);
                tokio::time::sleep(retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_busy
        .unwrap_or_else(|| ShareError::ConnectionFailed("retries exhausted".to_string())))
}

/// Local-disk implementation: connecting is a liveness check that the root
/// exists and is accessible; there is nothing to disconnect.
pub struct LocalMount {
    root: PathBuf,
}

impl LocalMount {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ShareMounter for LocalMount {
    async fn connect(&self) -> Result<(), ShareError> {
        if fs::try_exists(&self.root).await.unwrap_or(false) {
            tracing::info!(root = %self.root.display(), "using local storage root");
            Ok(())
        } else {
            Err(ShareError::RootUnavailable(format!(
                "local path {} does not exist or is not accessible",
                self.root.display()
            )))
        }
    }

    async fn disconnect(&self) {}
}

/// Credentialed network share mounted through configurable helper commands
/// (mount/unmount strategy per deployment OS). Credentials reach the helper
/// via environment variables, never the command line.
pub struct RemoteMount {
    remote_path: String,
    username: String,
    password: String,
    local_root: PathBuf,
    mount_cmd: String,
    unmount_cmd: String,
}

impl RemoteMount {
    pub fn new(
        remote_path: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        local_root: impl Into<PathBuf>,
        mount_cmd: impl Into<String>,
        unmount_cmd: impl Into<String>,
    ) -> Self {
        Self {
            remote_path: remote_path.into(),
            username: username.into(),
            password: password.into(),
            local_root: local_root.into(),
            mount_cmd: mount_cmd.into(),
            unmount_cmd: unmount_cmd.into(),
        }
    }

    async fn run_helper(&self, cmd: &str) -> Result<(), ShareError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .env("SHARE_REMOTE_PATH", &self.remote_path)
            .env("SHARE_USERNAME", &self.username)
            .env("SHARE_PASSWORD", &self.password)
            .env("SHARE_LOCAL_ROOT", &self.local_root)
            .output()
            .await
            .map_err(|e| ShareError::ConnectionFailed(format!("helper spawn failed: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let lowered = stderr.to_lowercase();
        if lowered.contains("busy") || lowered.contains("already mounted") {
            Err(ShareError::Busy(stderr))
        } else {
            Err(ShareError::ConnectionFailed(stderr))
        }
    }
}

#[async_trait]
impl ShareMounter for RemoteMount {
    async fn connect(&self) -> Result<(), ShareError> {
        tracing::info!(
            remote = %self.remote_path,
            username = %self.username,
            "connecting network share"
        );
        self.run_helper(&self.mount_cmd).await?;

        // The mount can report success while the share itself is absent.
        if fs::try_exists(&self.local_root).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(ShareError::RootUnavailable(format!(
                "network share {} is not accessible",
                self.remote_path
            )))
        }
    }

    async fn disconnect(&self) {
        if let Err(err) = self.run_helper(&self.unmount_cmd).await {
            tracing::warn!(remote = %self.remote_path, error = %err, "share disconnect failed");
        } else {
            tracing::info!(remote = %self.remote_path, "network share disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct ScriptedMounter {
        connects: AtomicU32,
        disconnects: AtomicU32,
        results: Vec<Result<(), ShareError>>,
    }

    impl ScriptedMounter {
        fn new(results: Vec<Result<(), ShareError>>) -> Arc<Self> {
            Arc::new(Self {
                connects: AtomicU32::new(0),
                disconnects: AtomicU32::new(0),
                results,
            })
        }
    }

    #[async_trait]
    impl ShareMounter for ScriptedMounter {
        async fn connect(&self) -> Result<(), ShareError> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst) as usize;
            match self.results.get(n) {
                Some(Ok(())) => Ok(()),
                Some(Err(ShareError::Busy(m))) => Err(ShareError::Busy(m.clone())),
                Some(Err(ShareError::RootUnavailable(m))) => {
                    Err(ShareError::RootUnavailable(m.clone()))
                }
                Some(Err(ShareError::ConnectionFailed(m))) => {
                    Err(ShareError::ConnectionFailed(m.clone()))
                }
                None => Ok(()),
            }
        }

        async fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn busy_failures_retry_up_to_the_bound() {
        let mounter = ScriptedMounter::new(vec![
            Err(ShareError::Busy("1219".to_string())),
            Err(ShareError::Busy("1219".to_string())),
            Err(ShareError::Busy("1219".to_string())),
        ]);

        let result =
            connect_with_retry(mounter.as_ref(), 3, Duration::from_millis(1)).await;

        assert!(matches!(result, Err(ShareError::Busy(_))));
        assert_eq!(mounter.connects.load(Ordering::SeqCst), 3);
        // A stale connection is dropped before every attempt.
        assert_eq!(mounter.disconnects.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn busy_then_success_stops_retrying() {
        let mounter =
            ScriptedMounter::new(vec![Err(ShareError::Busy("1219".to_string())), Ok(())]);

        let result =
            connect_with_retry(mounter.as_ref(), 3, Duration::from_millis(1)).await;

        assert!(result.is_ok());
        assert_eq!(mounter.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_busy_failures_abort_on_the_first_attempt() {
        let mounter = ScriptedMounter::new(vec![Err(ShareError::ConnectionFailed(
            "access denied".to_string(),
        ))]);

        let result =
            connect_with_retry(mounter.as_ref(), 3, Duration::from_millis(1)).await;

        assert!(matches!(result, Err(ShareError::ConnectionFailed(_))));
        assert_eq!(mounter.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn local_mount_liveness_check() {
        let dir = tempfile::tempdir().unwrap();
        let mount = LocalMount::new(dir.path());
        assert!(mount.connect().await.is_ok());

        let missing = LocalMount::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            missing.connect().await,
            Err(ShareError::RootUnavailable(_))
        ));
    }
}
