use std::{
    collections::HashSet,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;

/// Stages uploaded documents on disk for the duration of one request.
#[derive(Clone, Debug)]
pub struct DocumentManager {
    upload_dir: PathBuf,
    supported_extensions: HashSet<String>,
}

impl DocumentManager {
    pub async fn new<P, S>(upload_dir: P, supported_extensions: &[S]) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let upload_dir = upload_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&upload_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create upload directory at {}",
                    upload_dir.display()
                )
            })?;

        let supported_extensions = supported_extensions
            .iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(Self {
            upload_dir,
            supported_extensions,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.supported_extensions.iter().cloned().collect();
        extensions.sort();
        extensions
    }

    pub fn is_supported_file(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|os| os.to_str())
            .map(normalize_extension)
            .is_some_and(|ext| self.supported_extensions.contains(&ext))
    }

    /// Base name of an uploaded file, rejecting empty names and path traversal.
    pub fn sanitize_filename(&self, raw: &str) -> Result<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("filename cannot be empty"));
        }

        if trimmed.contains("..") || trimmed.contains('/') || trimmed.contains('\\') {
            return Err(anyhow!("invalid filename"));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(anyhow!("filename contains control characters"));
        }

        Ok(trimmed.to_string())
    }

    /// Writes an upload under a unique name in the upload directory.
    ///
    /// The file is deleted when the returned handle is dropped, so a request
    /// abandoned mid-processing does not leave it behind.
    pub async fn stage_upload(&self, filename: &str, bytes: Vec<u8>) -> Result<NamedTempFile> {
        let upload_dir = self.upload_dir.clone();
        let suffix = format!("-{filename}");
        spawn_blocking(move || {
            let mut staged = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(&suffix)
                .tempfile_in(&upload_dir)
                .with_context(|| format!("failed to stage upload in {}", upload_dir.display()))?;
            staged
                .write_all(&bytes)
                .with_context(|| format!("failed to persist upload {}", staged.path().display()))?;
            Ok::<_, anyhow::Error>(staged)
        })
        .await
        .context("upload staging task failed")?
    }
}

pub fn normalize_extension(ext: &str) -> String {
    ext.trim()
        .strip_prefix('.')
        .unwrap_or(ext.trim())
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager(dir: &Path) -> DocumentManager {
        DocumentManager::new(dir.join("uploads"), &["pdf", ".PNG"])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;
        assert!(manager.is_supported_file("cert.PDF"));
        assert!(manager.is_supported_file("scan.png"));
        assert!(!manager.is_supported_file("notes.txt"));
        assert!(!manager.is_supported_file("pdf"));
        assert_eq!(manager.supported_extensions(), vec!["pdf", "png"]);
    }

    #[tokio::test]
    async fn sanitize_rejects_traversal_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;
        assert!(manager.sanitize_filename("   ").is_err());
        assert!(manager.sanitize_filename("../etc/passwd").is_err());
        assert!(manager.sanitize_filename("a\\b.pdf").is_err());
        assert_eq!(manager.sanitize_filename(" cert.pdf ").unwrap(), "cert.pdf");
    }

    #[tokio::test]
    async fn staged_uploads_do_not_collide_and_are_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;

        let first = manager.stage_upload("cert.pdf", b"one".to_vec()).await.unwrap();
        let second = manager.stage_upload("cert.pdf", b"two".to_vec()).await.unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(manager.upload_dir()));
        assert!(first.path().to_string_lossy().ends_with("-cert.pdf"));
        assert_eq!(std::fs::read(second.path()).unwrap(), b"two");

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        assert!(second.path().exists());
    }

    #[tokio::test]
    async fn staged_upload_is_removed_when_its_task_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;

        let staged = manager.stage_upload("cert.pdf", b"scan".to_vec()).await.unwrap();
        let path = staged.path().to_path_buf();
        let task = tokio::spawn(async move {
            let _staged = staged;
            std::future::pending::<()>().await;
        });
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(manager.upload_dir()).unwrap().count(), 0);
    }
}
