//! Validation, staging, and relocation of uploaded attachments.

use std::path::{Path, PathBuf};

use serde_json::json;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("Missing file extension: {0}")]
    MissingExtension(String),

    #[error("Invalid file type '{extension}' (allowed: {allowed:?})")]
    InvalidFileType {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Filename resolves outside the staging root: {0}")]
    PathTraversal(String),

    #[error("Staging root unavailable: {0}")]
    RootUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file written to the staging root, awaiting relocation.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub original_name: String,
    /// Collision-resistant storage name: `{uuid}_{original}`. The original
    /// name is preserved in the suffix for audit.
    pub storage_name: String,
    pub staged_path: PathBuf,
    pub size: u64,
    pub content_type: String,
}

/// A staged file after relocation into its applicant directory.
#[derive(Debug, Clone)]
pub struct FinalFile {
    pub storage_name: String,
    pub final_path: PathBuf,
}

/// Serialize staged-file metadata for the persistence operation.
pub fn files_metadata_json(files: &[StagedFile]) -> String {
    let entries: Vec<_> = files
        .iter()
        .map(|f| {
            json!({
                "FilePath": f.staged_path.to_string_lossy().replace('\\', "/"),
                "FileName": f.storage_name,
                "FileSize": f.size,
                "FileType": f.content_type,
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

/// Stages and relocates uploaded attachments under one storage root.
#[derive(Clone)]
pub struct FileIntake {
    staging_root: PathBuf,
    allowed_extensions: Vec<String>,
}

impl FileIntake {
    pub async fn new(
        staging_root: impl Into<PathBuf>,
        allowed_extensions: &[&str],
    ) -> Result<Self, IntakeError> {
        let staging_root = staging_root.into();
        fs::create_dir_all(&staging_root)
            .await
            .map_err(|e| IntakeError::RootUnavailable(format!("{}: {}", staging_root.display(), e)))?;
        Ok(Self {
            staging_root,
            allowed_extensions: allowed_extensions.iter().map(|e| e.to_string()).collect(),
        })
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    fn validate_extension(&self, original_name: &str) -> Result<(), IntakeError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| IntakeError::MissingExtension(original_name.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(IntakeError::InvalidFileType {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }
        Ok(())
    }

    /// Resolve a storage name under the staging root, rejecting anything
    /// that could escape it. Checked before any byte is written.
    fn resolve_under_root(&self, name: &str) -> Result<PathBuf, IntakeError> {
        if name.contains("..") || name.contains('/') || name.contains('\\') || name.is_empty() {
            return Err(IntakeError::PathTraversal(name.to_string()));
        }
        let path = self.staging_root.join(name);
        if !path.starts_with(&self.staging_root) {
            return Err(IntakeError::PathTraversal(name.to_string()));
        }
        Ok(path)
    }

    /// Validate one upload and write it to the staging root.
    pub async fn validate_and_stage(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StagedFile, IntakeError> {
        if data.is_empty() {
            return Err(IntakeError::EmptyFile(original_name.to_string()));
        }
        self.validate_extension(original_name)?;

        // The original client filename rides along in the storage name, so
        // it gets the same traversal guard as the generated part.
        let storage_name = format!("{}_{}", Uuid::new_v4(), original_name);
        let staged_path = self.resolve_under_root(&storage_name)?;

        let mut file = fs::File::create(&staged_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %staged_path.display(),
            size_bytes = data.len(),
            "staged uploaded file"
        );

        Ok(StagedFile {
            original_name: original_name.to_string(),
            storage_name,
            staged_path,
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    /// Move staged files into the applicant's directory. Called only after
    /// the applicant row exists. A pre-existing directory is cleared, not
    /// merged. A staged file missing at move time is a logged warning; the
    /// database commit already succeeded.
    pub async fn relocate(
        &self,
        applicant_id: i32,
        staged: &[StagedFile],
    ) -> Result<Vec<FinalFile>, IntakeError> {
        if applicant_id <= 0 || staged.is_empty() {
            return Ok(Vec::new());
        }

        let applicant_dir = self.staging_root.join(format!("applicant_{}", applicant_id));
        if fs::try_exists(&applicant_dir).await.unwrap_or(false) {
            let mut entries = fs::read_dir(&applicant_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    fs::remove_file(entry.path()).await?;
                    tracing::info!(path = %entry.path().display(), "deleted previous applicant file");
                }
            }
        } else {
            fs::create_dir_all(&applicant_dir).await?;
            tracing::info!(path = %applicant_dir.display(), "created applicant directory");
        }

        let mut moved = Vec::with_capacity(staged.len());
        for file in staged {
            let final_path = applicant_dir.join(&file.storage_name);
            if fs::try_exists(&file.staged_path).await.unwrap_or(false) {
                fs::rename(&file.staged_path, &final_path).await?;
                tracing::info!(
                    from = %file.staged_path.display(),
                    to = %final_path.display(),
                    "moved file to applicant directory"
                );
                moved.push(FinalFile {
                    storage_name: file.storage_name.clone(),
                    final_path,
                });
            } else {
                tracing::warn!(
                    path = %file.staged_path.display(),
                    "staged file missing at relocation time"
                );
            }
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdesk_core::constants::SUBMISSION_ALLOWED_EXTENSIONS;
    use tempfile::tempdir;

    async fn intake(dir: &tempfile::TempDir) -> FileIntake {
        FileIntake::new(dir.path(), SUBMISSION_ALLOWED_EXTENSIONS)
            .await
            .unwrap()
    }

    async fn staged_file_count(root: &Path) -> usize {
        let mut count = 0;
        let mut entries = fs::read_dir(root).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.file_type().await.unwrap().is_file() {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn accepted_extensions_stage_under_the_root() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        for name in ["cv.pdf", "cv.doc", "cv.docx", "photo.png", "photo.jpg"] {
            let staged = intake
                .validate_and_stage(name, "application/octet-stream", b"content")
                .await
                .unwrap();
            assert!(staged.staged_path.starts_with(dir.path()));
            assert!(staged.storage_name.ends_with(name));
            assert!(fs::try_exists(&staged.staged_path).await.unwrap());
        }
    }

    #[tokio::test]
    async fn rejected_extension_writes_nothing() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        let result = intake
            .validate_and_stage("payload.exe", "application/octet-stream", b"MZ")
            .await;
        assert!(matches!(result, Err(IntakeError::InvalidFileType { .. })));
        assert_eq!(staged_file_count(dir.path()).await, 0);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        let result = intake
            .validate_and_stage("cv.pdf", "application/pdf", b"")
            .await;
        assert!(matches!(result, Err(IntakeError::EmptyFile(_))));
    }

    #[tokio::test]
    async fn traversal_names_are_rejected_before_any_write() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        for name in ["../../etc/passwd.pdf", "a/../../b.pdf", "dir/cv.pdf"] {
            let result = intake
                .validate_and_stage(name, "application/pdf", b"content")
                .await;
            assert!(
                matches!(result, Err(IntakeError::PathTraversal(_))),
                "name {:?} must be rejected",
                name
            );
        }
        assert_eq!(staged_file_count(dir.path()).await, 0);
    }

    #[tokio::test]
    async fn relocate_moves_staged_files_into_applicant_directory() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        let staged = intake
            .validate_and_stage("cv.pdf", "application/pdf", b"resume")
            .await
            .unwrap();
        let moved = intake.relocate(42, &[staged.clone()]).await.unwrap();

        assert_eq!(moved.len(), 1);
        assert!(moved[0]
            .final_path
            .starts_with(dir.path().join("applicant_42")));
        assert!(!fs::try_exists(&staged.staged_path).await.unwrap());
        assert!(fs::try_exists(&moved[0].final_path).await.unwrap());
    }

    #[tokio::test]
    async fn relocate_clears_preexisting_contents() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        let first = intake
            .validate_and_stage("old.pdf", "application/pdf", b"old resume")
            .await
            .unwrap();
        intake.relocate(7, &[first]).await.unwrap();

        // A second relocation replaces the directory contents wholesale.
        let second = intake
            .validate_and_stage("new.pdf", "application/pdf", b"new resume")
            .await
            .unwrap();
        let moved = intake.relocate(7, &[second]).await.unwrap();

        assert_eq!(moved.len(), 1);
        let applicant_dir = dir.path().join("applicant_7");
        assert_eq!(staged_file_count(&applicant_dir).await, 1);
        assert!(moved[0].storage_name.ends_with("new.pdf"));
    }

    #[tokio::test]
    async fn missing_staged_file_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let intake = intake(&dir).await;

        let mut staged = intake
            .validate_and_stage("cv.pdf", "application/pdf", b"resume")
            .await
            .unwrap();
        fs::remove_file(&staged.staged_path).await.unwrap();
        staged.size = 6;

        let moved = intake.relocate(9, &[staged]).await.unwrap();
        assert!(moved.is_empty());
    }

    #[test]
    fn metadata_json_carries_the_canonical_keys() {
        let staged = StagedFile {
            original_name: "cv.pdf".to_string(),
            storage_name: "abc_cv.pdf".to_string(),
            staged_path: PathBuf::from("/var/jobdesk/staging/abc_cv.pdf"),
            size: 1234,
            content_type: "application/pdf".to_string(),
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&files_metadata_json(&[staged])).unwrap();
        assert_eq!(parsed[0]["FileName"], "abc_cv.pdf");
        assert_eq!(parsed[0]["FileSize"], 1234);
        assert_eq!(parsed[0]["FileType"], "application/pdf");
        assert_eq!(parsed[0]["FilePath"], "/var/jobdesk/staging/abc_cv.pdf");
    }
}
